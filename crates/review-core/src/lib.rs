//! # review-core
//!
//! Domain layer for the vendor review engine: entities, value objects,
//! the rating aggregation engine, the moderation state machine, and the
//! port traits implemented by the remote store and the local cache.
//! This crate performs no I/O.

pub mod aggregation;
pub mod entities;
pub mod error;
pub mod moderation;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use aggregation::{AggregationEngine, RatingDelta, DEFAULT_WINDOW_DAYS};
pub use entities::{
    AuditAction, AuditEntry, FlagPatch, ReplyPatch, ReplyStatus, ReviewPatch, ReviewPrecondition,
    ReviewRecord, ReviewStatus, VendorIdentity, VendorReply, VendorReviewAggregate,
};
pub use error::{DomainError, RemoteFailure};
pub use moderation::{ModerationStateMachine, ReviewMutation, Transition};
pub use traits::{
    CacheResult, Clock, LocalReviewCache, ManualClock, RemoteResult, RemoteReviewStore,
    ReplyFilter, ReviewFilter, ReviewSort, SystemClock,
};
pub use value_objects::{star_bucket, CustomerId, ReviewId, VendorId, MAX_STARS, MIN_STARS};

//! # review-service
//!
//! Application layer: the sync coordinator that keeps the local cache in
//! step with the remote store, and the moderation, reply, query and stats
//! services built on top of it.

pub mod dto;
pub mod services;

pub use dto::{FlagRequest, MutationOutcome, RefreshSummary, ReplyRequest, SoftDeleteRequest};
pub use services::{
    KeyedLocks, ModerationService, QueryService, ReplyService, ReviewLocks, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, StatsService, SyncCoordinator,
    SyncSettings, VendorLocks,
};

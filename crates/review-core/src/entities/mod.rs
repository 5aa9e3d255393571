//! Domain entities - core business objects

mod aggregate;
mod audit;
mod identity;
mod patch;
mod reply;
mod review;

pub use aggregate::VendorReviewAggregate;
pub use audit::{AuditAction, AuditEntry};
pub use identity::VendorIdentity;
pub use patch::{FlagPatch, ReplyPatch, ReviewPatch, ReviewPrecondition};
pub use reply::{ReplyStatus, VendorReply};
pub use review::{ReviewRecord, ReviewStatus};

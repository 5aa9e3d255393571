//! Business logic services
//!
//! Every service borrows a [`ServiceContext`] and is cheap to construct per
//! call. Mutations go through [`SyncCoordinator::apply_mutation`].

pub mod context;
pub mod error;
pub mod locks;
pub mod moderation;
pub mod query;
pub mod reply;
pub mod stats;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{ServiceContext, ServiceContextBuilder, SyncSettings};
pub use error::{ServiceError, ServiceResult};
pub use locks::{KeyedLocks, ReviewLocks, VendorLocks};
pub use moderation::ModerationService;
pub use query::QueryService;
pub use reply::ReplyService;
pub use stats::StatsService;
pub use sync::SyncCoordinator;

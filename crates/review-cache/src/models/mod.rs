//! Database models
//!
//! Row structs for the cache tables. Timestamps are stored as epoch
//! milliseconds so ordering and staleness checks stay integer comparisons.

mod aggregate;
mod review;

pub use aggregate::{AggregateModel, SyncStateModel};
pub use review::ReviewModel;

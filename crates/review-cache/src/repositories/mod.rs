//! Cache store implementations
//!
//! SQLite implementation of the `LocalReviewCache` trait defined in review-core.

mod error;
mod review_cache;

pub use review_cache::SqliteReviewCache;

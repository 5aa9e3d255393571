//! # review-remote
//!
//! Remote side of the review engine.
//!
//! - [`documents`]: the camelCase JSON documents stored per vendor
//! - [`mappers`]: explicit document <-> entity conversions
//! - [`InMemoryReviewStore`]: an in-process `RemoteReviewStore` with
//!   connectivity and failure simulation, used by tests and local runs

pub mod documents;
pub mod mappers;
mod memory;

pub use documents::{AggregateDocument, AuditDocument, ReviewDocument, VendorReplyDocument};
pub use memory::InMemoryReviewStore;

//! Remote review store port
//!
//! The remote document store is authoritative for every review, aggregate
//! and audit entry. Implementations report connectivity problems as
//! [`DomainError::RemoteUnavailable`].

use async_trait::async_trait;

use crate::entities::{
    AuditEntry, ReviewPatch, ReviewPrecondition, ReviewRecord, VendorReviewAggregate,
};
use crate::error::DomainError;
use crate::value_objects::{ReviewId, VendorId};

/// Result type for remote store operations
pub type RemoteResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait RemoteReviewStore: Send + Sync {
    /// List the vendor's reviews that are not hidden, newest first
    async fn list_active_reviews(&self, vendor_id: &VendorId) -> RemoteResult<Vec<ReviewRecord>>;

    /// Fetch one review regardless of status
    async fn get_review(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
    ) -> RemoteResult<Option<ReviewRecord>>;

    /// Fetch the vendor's aggregate document, if one exists
    async fn get_aggregate(&self, vendor_id: &VendorId)
        -> RemoteResult<Option<VendorReviewAggregate>>;

    /// Apply `patch` to the review and append `audit` in one atomic write
    ///
    /// `expected` is checked against the stored review inside the same write;
    /// a mismatch fails with the error [`ReviewPrecondition::check`] returns
    /// and writes nothing. Either both the review update and the audit entry
    /// commit, or neither does. Returns the review as stored after the write.
    async fn transactional_update(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        patch: &ReviewPatch,
        expected: &ReviewPrecondition,
        audit: Option<&AuditEntry>,
    ) -> RemoteResult<ReviewRecord>;

    /// Overwrite the vendor's aggregate document
    async fn set_aggregate(&self, aggregate: &VendorReviewAggregate) -> RemoteResult<()>;

    /// List the vendor's moderation audit trail, newest first
    async fn list_audit_entries(&self, vendor_id: &VendorId) -> RemoteResult<Vec<AuditEntry>>;
}

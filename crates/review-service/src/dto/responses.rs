//! Response DTOs

use serde::Serialize;

use review_core::{AuditEntry, ReviewRecord, VendorReviewAggregate};

/// Result of a moderation or reply mutation
///
/// `review` and `audit` are always committed remotely and mirrored locally.
/// The aggregate follow-up is separate: when it fails, `aggregate` is `None`
/// and `aggregate_synced` is false until the next recompute.
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    pub review: ReviewRecord,
    pub audit: AuditEntry,
    pub aggregate: Option<VendorReviewAggregate>,
    pub aggregate_synced: bool,
}

impl MutationOutcome {
    /// Outcome of a mutation that does not touch the aggregate
    pub fn without_aggregate(review: ReviewRecord, audit: AuditEntry) -> Self {
        Self {
            review,
            audit,
            aggregate: None,
            aggregate_synced: true,
        }
    }
}

/// Result of a full refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    /// Reviews now in the cache for the vendor
    pub reviews: usize,
    pub aggregate: VendorReviewAggregate,
}

//! In-process remote document store
//!
//! Holds review, aggregate and audit documents per vendor and commits each
//! `transactional_update` as one unit under a single write lock. Connectivity
//! can be degraded at runtime to exercise the offline and failure paths of the
//! sync layer.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use review_core::entities::{
    AuditEntry, ReviewPatch, ReviewPrecondition, ReviewRecord, VendorReviewAggregate,
};
use review_core::error::{DomainError, RemoteFailure};
use review_core::traits::{RemoteResult, RemoteReviewStore};
use review_core::value_objects::{ReviewId, VendorId};

use crate::documents::{AggregateDocument, AuditDocument, ReviewDocument};

#[derive(Default)]
struct Collections {
    reviews: HashMap<VendorId, BTreeMap<ReviewId, ReviewDocument>>,
    aggregates: HashMap<VendorId, AggregateDocument>,
    /// Append order is commit order
    audit_log: HashMap<VendorId, Vec<AuditDocument>>,
}

#[derive(Debug, Default)]
struct Connectivity {
    offline: bool,
    latency: Option<Duration>,
    failing_updates: u32,
    failing_aggregate_writes: u32,
}

fn take(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

/// In-memory implementation of RemoteReviewStore
#[derive(Clone, Default)]
pub struct InMemoryReviewStore {
    collections: Arc<RwLock<Collections>>,
    connectivity: Arc<Mutex<Connectivity>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Connectivity simulation
    // =========================================================================

    /// Reject every call with `RemoteFailure::Offline` while set
    pub fn set_offline(&self, offline: bool) {
        self.connectivity.lock().offline = offline;
        debug!(offline, "[InMemoryReviewStore] Connectivity changed");
    }

    /// Delay every call by `latency` before it is served
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.connectivity.lock().latency = latency;
    }

    /// Fail the next `count` transactional updates with a service error
    pub fn fail_next_updates(&self, count: u32) {
        self.connectivity.lock().failing_updates = count;
    }

    /// Fail the next `count` aggregate writes with a service error
    pub fn fail_next_aggregate_writes(&self, count: u32) {
        self.connectivity.lock().failing_aggregate_writes = count;
    }

    /// Number of calls made through the `RemoteReviewStore` interface
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: &'static str) -> RemoteResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (offline, latency) = {
            let connectivity = self.connectivity.lock();
            (connectivity.offline, connectivity.latency)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if offline {
            debug!(operation, "[InMemoryReviewStore] Rejected while offline");
            return Err(RemoteFailure::Offline.into());
        }

        Ok(())
    }

    // =========================================================================
    // Direct access (bypasses connectivity)
    // =========================================================================

    /// Store a review as if a customer had just submitted it
    pub async fn seed_review(&self, record: &ReviewRecord) {
        let mut collections = self.collections.write().await;
        collections
            .reviews
            .entry(record.vendor_id.clone())
            .or_default()
            .insert(record.review_id.clone(), ReviewDocument::from(record));
    }

    /// Overwrite the vendor's aggregate document
    pub async fn seed_aggregate(&self, aggregate: &VendorReviewAggregate) {
        let mut collections = self.collections.write().await;
        collections
            .aggregates
            .insert(aggregate.vendor_id.clone(), AggregateDocument::from(aggregate));
    }

    /// Raw review document, as stored
    pub async fn review_document(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
    ) -> Option<ReviewDocument> {
        let collections = self.collections.read().await;
        collections
            .reviews
            .get(vendor_id)
            .and_then(|reviews| reviews.get(review_id))
            .cloned()
    }

    /// Raw aggregate document, as stored
    pub async fn aggregate_document(&self, vendor_id: &VendorId) -> Option<AggregateDocument> {
        self.collections.read().await.aggregates.get(vendor_id).cloned()
    }

    /// Number of audit documents stored for the vendor
    pub async fn audit_len(&self, vendor_id: &VendorId) -> usize {
        self.collections
            .read()
            .await
            .audit_log
            .get(vendor_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl RemoteReviewStore for InMemoryReviewStore {
    #[instrument(skip(self))]
    async fn list_active_reviews(&self, vendor_id: &VendorId) -> RemoteResult<Vec<ReviewRecord>> {
        self.enter("list_active_reviews").await?;

        let documents: Vec<ReviewDocument> = {
            let collections = self.collections.read().await;
            collections
                .reviews
                .get(vendor_id)
                .map(|reviews| {
                    reviews
                        .values()
                        .filter(|doc| doc.status != "HIDDEN")
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut records = documents
            .into_iter()
            .map(ReviewRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.review_id.cmp(&b.review_id))
        });

        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get_review(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
    ) -> RemoteResult<Option<ReviewRecord>> {
        self.enter("get_review").await?;

        self.review_document(vendor_id, review_id)
            .await
            .map(ReviewRecord::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn get_aggregate(
        &self,
        vendor_id: &VendorId,
    ) -> RemoteResult<Option<VendorReviewAggregate>> {
        self.enter("get_aggregate").await?;

        self.aggregate_document(vendor_id)
            .await
            .map(VendorReviewAggregate::try_from)
            .transpose()
    }

    #[instrument(skip(self, patch, expected, audit))]
    async fn transactional_update(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        patch: &ReviewPatch,
        expected: &ReviewPrecondition,
        audit: Option<&AuditEntry>,
    ) -> RemoteResult<ReviewRecord> {
        self.enter("transactional_update").await?;

        if take(&mut self.connectivity.lock().failing_updates) {
            return Err(RemoteFailure::Service("transaction aborted".to_string()).into());
        }
        if patch.is_empty() {
            return Err(DomainError::validation("empty review patch"));
        }
        if let Some(entry) = audit {
            if entry.review_id() != review_id || entry.vendor_id() != vendor_id {
                return Err(DomainError::Internal(format!(
                    "audit entry {} does not belong to review {review_id}",
                    entry.entry_id()
                )));
            }
        }

        let mut collections = self.collections.write().await;

        let current = collections
            .reviews
            .get(vendor_id)
            .and_then(|reviews| reviews.get(review_id))
            .cloned()
            .ok_or_else(|| DomainError::ReviewNotFound(review_id.clone()))?;

        // Build both documents before touching the collections.
        let mut record = ReviewRecord::try_from(current)?;
        if let Err(e) = expected.check(&record) {
            debug!(review_id = %review_id, error = %e, "[InMemoryReviewStore] Precondition failed");
            return Err(e);
        }
        patch.apply(&mut record);
        let updated = ReviewDocument::from(&record);
        let audit_doc = audit.map(AuditDocument::from);

        collections
            .reviews
            .entry(vendor_id.clone())
            .or_default()
            .insert(review_id.clone(), updated.clone());
        if let Some(doc) = audit_doc {
            collections
                .audit_log
                .entry(vendor_id.clone())
                .or_default()
                .push(doc);
        }

        debug!(vendor_id = %vendor_id, review_id = %review_id, "Review document committed");
        ReviewRecord::try_from(updated)
    }

    #[instrument(skip(self, aggregate), fields(vendor_id = %aggregate.vendor_id))]
    async fn set_aggregate(&self, aggregate: &VendorReviewAggregate) -> RemoteResult<()> {
        self.enter("set_aggregate").await?;

        if take(&mut self.connectivity.lock().failing_aggregate_writes) {
            return Err(RemoteFailure::Service("aggregate write rejected".to_string()).into());
        }

        self.seed_aggregate(aggregate).await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_audit_entries(&self, vendor_id: &VendorId) -> RemoteResult<Vec<AuditEntry>> {
        self.enter("list_audit_entries").await?;

        let documents: Vec<AuditDocument> = self
            .collections
            .read()
            .await
            .audit_log
            .get(vendor_id)
            .map(|log| log.iter().rev().cloned().collect())
            .unwrap_or_default();

        documents.into_iter().map(AuditEntry::try_from).collect()
    }
}

//! Query service
//!
//! Read-only access to the local cache. Nothing here touches the network.

use tracing::instrument;

use review_core::{ReviewFilter, ReviewId, ReviewRecord, VendorId, VendorReviewAggregate};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Query service
pub struct QueryService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> QueryService<'a> {
    /// Create a new QueryService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Cached reviews that are not hidden, filtered and sorted
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        vendor_id: &VendorId,
        filter: &ReviewFilter,
    ) -> ServiceResult<Vec<ReviewRecord>> {
        Ok(self.ctx.cache().list_active(vendor_id, filter).await?)
    }

    /// One cached review, hidden ones included
    #[instrument(skip(self))]
    pub async fn get(&self, vendor_id: &VendorId, review_id: &ReviewId) -> ServiceResult<ReviewRecord> {
        self.ctx
            .cache()
            .get_review(vendor_id, review_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Review", review_id.as_str()))
    }

    /// Cached aggregate, zero-valued if none has been pulled yet
    #[instrument(skip(self))]
    pub async fn aggregate(&self, vendor_id: &VendorId) -> ServiceResult<VendorReviewAggregate> {
        Ok(self.ctx.cache().get_or_default_aggregate(vendor_id).await?)
    }
}

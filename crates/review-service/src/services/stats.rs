//! Stats service
//!
//! Rebuilds a vendor's aggregate from the remote reviews. This is the repair
//! path for drifted or missing aggregates and is safe to run at any time.

use tracing::{info, instrument};

use review_core::{VendorId, VendorReviewAggregate};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Stats service
pub struct StatsService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> StatsService<'a> {
    /// Create a new StatsService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Recompute the aggregate from scratch and store it remotely and locally
    ///
    /// Holds the vendor's aggregate lock, but no review locks, while the
    /// remote scan runs.
    #[instrument(skip(self))]
    pub async fn recompute(&self, vendor_id: &VendorId) -> ServiceResult<VendorReviewAggregate> {
        let guard = self.ctx.aggregate_locks().acquire(vendor_id).await;
        let result = self.recompute_locked(vendor_id).await;
        drop(guard);
        self.ctx.aggregate_locks().prune();

        result
    }

    async fn recompute_locked(&self, vendor_id: &VendorId) -> ServiceResult<VendorReviewAggregate> {
        let reviews = self
            .ctx
            .remote_call(
                "list_active_reviews",
                self.ctx.remote().list_active_reviews(vendor_id),
            )
            .await?;

        let aggregate = self
            .ctx
            .aggregation()
            .recompute_from_scratch(vendor_id, &reviews, self.ctx.now());

        self.ctx
            .remote_call("set_aggregate", self.ctx.remote().set_aggregate(&aggregate))
            .await?;
        self.ctx.cache().set_aggregate(&aggregate).await?;

        info!(
            vendor_id = %vendor_id,
            total_reviews = aggregate.total_reviews,
            average_rating = aggregate.average_rating,
            "Aggregate recomputed"
        );

        Ok(aggregate)
    }

    /// Cached aggregate, zero-valued if none is cached
    #[instrument(skip(self))]
    pub async fn aggregate(&self, vendor_id: &VendorId) -> ServiceResult<VendorReviewAggregate> {
        Ok(self.ctx.cache().get_or_default_aggregate(vendor_id).await?)
    }
}

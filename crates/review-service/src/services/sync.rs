//! Sync coordinator
//!
//! Pulls remote state into the local cache and runs every mutation as a
//! two-phase write-through: the remote store commits first, then the cache
//! mirrors the committed change. A failed remote write leaves the cache
//! untouched.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use review_core::{
    RatingDelta, ReviewId, ReviewMutation, ReviewRecord, Transition, VendorId, VendorIdentity,
    VendorReviewAggregate,
};

use crate::dto::{MutationOutcome, RefreshSummary};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Sync coordinator
pub struct SyncCoordinator<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SyncCoordinator<'a> {
    /// Create a new SyncCoordinator
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Replace the vendor's cached reviews with the remote listing
    ///
    /// Returns the number of reviews cached. On any remote failure the cache
    /// keeps its previous contents.
    #[instrument(skip(self))]
    pub async fn pull_reviews(&self, vendor_id: &VendorId) -> ServiceResult<usize> {
        let records = match self
            .ctx
            .remote_call(
                "list_active_reviews",
                self.ctx.remote().list_active_reviews(vendor_id),
            )
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(vendor_id = %vendor_id, error = %e, "Review pull failed, serving cached reviews");
                return Err(e);
            }
        };

        let now = self.ctx.now();
        self.ctx.cache().replace_all(vendor_id, &records, now).await?;

        info!(vendor_id = %vendor_id, count = records.len(), "Reviews pulled");
        Ok(records.len())
    }

    /// Fetch the vendor's aggregate and cache it
    ///
    /// A vendor without an aggregate document gets a zero-valued one.
    #[instrument(skip(self))]
    pub async fn pull_aggregate(&self, vendor_id: &VendorId) -> ServiceResult<VendorReviewAggregate> {
        let remote = match self
            .ctx
            .remote_call("get_aggregate", self.ctx.remote().get_aggregate(vendor_id))
            .await
        {
            Ok(remote) => remote,
            Err(e) => {
                warn!(vendor_id = %vendor_id, error = %e, "Aggregate pull failed, serving cached aggregate");
                return Err(e);
            }
        };

        let aggregate = remote.unwrap_or_else(|| {
            debug!(vendor_id = %vendor_id, "No remote aggregate yet");
            VendorReviewAggregate::empty(vendor_id.clone())
        });
        self.ctx.cache().set_aggregate(&aggregate).await?;

        Ok(aggregate)
    }

    /// Pull reviews only if the last pull is older than the stale threshold
    ///
    /// Returns `None` when the cache was fresh enough to skip the pull.
    #[instrument(skip(self))]
    pub async fn pull_if_stale(&self, vendor_id: &VendorId) -> ServiceResult<Option<usize>> {
        let now = self.ctx.now();
        let last_pulled = self.ctx.cache().last_pulled_at(vendor_id).await?;

        if last_pulled.is_some_and(|at| now - at <= self.ctx.settings().stale_after) {
            debug!(vendor_id = %vendor_id, "Cached reviews are fresh, skipping pull");
            return Ok(None);
        }

        self.pull_reviews(vendor_id).await.map(Some)
    }

    /// Pull both reviews and aggregate
    #[instrument(skip(self))]
    pub async fn refresh(&self, vendor_id: &VendorId) -> ServiceResult<RefreshSummary> {
        let reviews = self.pull_reviews(vendor_id).await?;
        let aggregate = self.pull_aggregate(vendor_id).await?;

        Ok(RefreshSummary { reviews, aggregate })
    }

    /// Re-fetch cached reviews not confirmed within the stale threshold
    ///
    /// Returns the number of reviews refreshed. Reviews the remote store no
    /// longer has are left as cached.
    #[instrument(skip(self))]
    pub async fn refresh_stale_reviews(&self, vendor_id: &VendorId) -> ServiceResult<usize> {
        let older_than = self.ctx.now() - self.ctx.settings().stale_after;
        let stale = self.ctx.cache().stale_reviews(vendor_id, older_than).await?;

        let mut refreshed = 0;
        for review_id in &stale {
            let guard = self.ctx.locks().acquire(review_id).await;
            let result = self.refresh_review(vendor_id, review_id).await;
            drop(guard);
            self.ctx.locks().prune();

            if result?.is_some() {
                refreshed += 1;
            }
        }

        info!(vendor_id = %vendor_id, stale = stale.len(), refreshed, "Stale reviews refreshed");
        Ok(refreshed)
    }

    /// Validate and apply one mutation to a review
    ///
    /// Mutations on the same review are serialized. The caller must be signed
    /// in as the owning vendor.
    #[instrument(skip(self, mutation), fields(kind = mutation.kind()))]
    pub async fn apply_mutation(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        mutation: ReviewMutation,
    ) -> ServiceResult<MutationOutcome> {
        let identity = self.ctx.require_identity(vendor_id)?;
        let mutation = mutation.validate()?;

        let guard = self.ctx.locks().acquire(review_id).await;
        let result = self
            .apply_locked(vendor_id, review_id, &identity, mutation)
            .await;
        drop(guard);
        self.ctx.locks().prune();

        result
    }

    async fn apply_locked(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        identity: &VendorIdentity,
        mutation: ReviewMutation,
    ) -> ServiceResult<MutationOutcome> {
        let record = self.load_record(vendor_id, review_id).await?;
        let now = self.ctx.now();

        let transition = self
            .ctx
            .moderation()
            .transition(&record, identity, mutation, now)?;

        let committed = self.write_remote(vendor_id, review_id, &transition).await?;
        let review = self.mirror_local(committed, now).await?;

        let Transition {
            audit, rating_delta, ..
        } = transition;

        let outcome = match rating_delta {
            None => MutationOutcome::without_aggregate(review, audit),
            Some(delta) => match self.update_aggregate(vendor_id, &review, delta, now).await {
                Ok(aggregate) => MutationOutcome {
                    review,
                    audit,
                    aggregate: Some(aggregate),
                    aggregate_synced: true,
                },
                Err(e) => {
                    warn!(
                        vendor_id = %vendor_id,
                        review_id = %review_id,
                        error = %e,
                        "Aggregate update failed; recompute to repair"
                    );
                    MutationOutcome {
                        review,
                        audit,
                        aggregate: None,
                        aggregate_synced: false,
                    }
                }
            },
        };

        info!(
            vendor_id = %vendor_id,
            review_id = %review_id,
            action = outcome.audit.action().as_str(),
            aggregate_synced = outcome.aggregate_synced,
            "Review mutation applied"
        );

        Ok(outcome)
    }

    /// Current copy of the review: cache first, remote on a miss
    async fn load_record(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
    ) -> ServiceResult<ReviewRecord> {
        if let Some(record) = self.ctx.cache().get_review(vendor_id, review_id).await? {
            return Ok(record);
        }

        debug!(review_id = %review_id, "Review not cached, fetching from remote");
        self.ctx
            .remote_call(
                "get_review",
                self.ctx.remote().get_review(vendor_id, review_id),
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("Review", review_id.as_str()))
    }

    /// Fetch one review from the remote store and cache it
    async fn refresh_review(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
    ) -> ServiceResult<Option<ReviewRecord>> {
        let remote = self
            .ctx
            .remote_call(
                "get_review",
                self.ctx.remote().get_review(vendor_id, review_id),
            )
            .await?;

        match remote {
            Some(record) => self.mirror_local(record, self.ctx.now()).await.map(Some),
            None => {
                debug!(review_id = %review_id, "Review no longer on remote");
                Ok(None)
            }
        }
    }

    /// Write the transition, returning the review as the remote store committed it
    ///
    /// The remote store re-checks the transition's precondition. When that
    /// fails the cached copy was out of date, so it is refreshed before the
    /// error is returned.
    async fn write_remote(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        transition: &Transition,
    ) -> ServiceResult<ReviewRecord> {
        let result = self
            .ctx
            .remote_call(
                "transactional_update",
                self.ctx.remote().transactional_update(
                    vendor_id,
                    review_id,
                    &transition.patch,
                    &transition.precondition,
                    Some(&transition.audit),
                ),
            )
            .await;

        match result {
            Ok(committed) => Ok(committed),
            Err(e @ (ServiceError::InvalidTransition(_) | ServiceError::NotFound { .. })) => {
                warn!(review_id = %review_id, error = %e, "Remote review changed since it was cached");
                if let Err(refresh) = self.refresh_review(vendor_id, review_id).await {
                    debug!(review_id = %review_id, error = %refresh, "Refresh after rejected write failed");
                }
                Err(e)
            }
            Err(e) => {
                warn!(review_id = %review_id, error = %e, "Remote write failed, cache untouched");
                Err(e)
            }
        }
    }

    /// Store `record` as confirmed by the remote store at `now`
    async fn mirror_local(
        &self,
        mut record: ReviewRecord,
        now: DateTime<Utc>,
    ) -> ServiceResult<ReviewRecord> {
        record.last_synced_at = Some(now);

        if let Err(e) = self.ctx.cache().upsert_one(&record, now).await {
            error!(
                review_id = %record.review_id,
                error = %e,
                "Remote write committed but cache mirror failed"
            );
            return Err(e.into());
        }

        Ok(record)
    }

    /// Apply the rating change to the remote aggregate, then mirror it
    ///
    /// Runs under the vendor's aggregate lock. Only `review`'s rating and
    /// creation time are read.
    async fn update_aggregate(
        &self,
        vendor_id: &VendorId,
        review: &ReviewRecord,
        delta: RatingDelta,
        now: DateTime<Utc>,
    ) -> ServiceResult<VendorReviewAggregate> {
        let guard = self.ctx.aggregate_locks().acquire(vendor_id).await;
        let result = self.update_aggregate_locked(vendor_id, review, delta, now).await;
        drop(guard);
        self.ctx.aggregate_locks().prune();

        result
    }

    async fn update_aggregate_locked(
        &self,
        vendor_id: &VendorId,
        review: &ReviewRecord,
        delta: RatingDelta,
        now: DateTime<Utc>,
    ) -> ServiceResult<VendorReviewAggregate> {
        let base = self
            .ctx
            .remote_call("get_aggregate", self.ctx.remote().get_aggregate(vendor_id))
            .await?;

        let aggregate = match base {
            Some(mut aggregate) => {
                if self
                    .ctx
                    .aggregation()
                    .apply_review_delta(&mut aggregate, review, delta, now)
                {
                    aggregate
                } else {
                    warn!(vendor_id = %vendor_id, "Aggregate drifted, rebuilding from reviews");
                    self.rebuild_aggregate(vendor_id, now).await?
                }
            }
            None => {
                debug!(vendor_id = %vendor_id, "No remote aggregate, rebuilding from reviews");
                self.rebuild_aggregate(vendor_id, now).await?
            }
        };

        self.ctx
            .remote_call("set_aggregate", self.ctx.remote().set_aggregate(&aggregate))
            .await?;
        self.ctx.cache().set_aggregate(&aggregate).await?;

        Ok(aggregate)
    }

    /// Aggregate over the remote reviews, which already reflect every
    /// committed mutation
    async fn rebuild_aggregate(
        &self,
        vendor_id: &VendorId,
        now: DateTime<Utc>,
    ) -> ServiceResult<VendorReviewAggregate> {
        let reviews = self
            .ctx
            .remote_call(
                "list_active_reviews",
                self.ctx.remote().list_active_reviews(vendor_id),
            )
            .await?;

        Ok(self
            .ctx
            .aggregation()
            .recompute_from_scratch(vendor_id, &reviews, now))
    }
}

//! Local review cache port
//!
//! An embedded, queryable mirror of the remote store. Every read must work
//! without network access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{ReviewRecord, VendorReviewAggregate};
use crate::error::DomainError;
use crate::value_objects::{ReviewId, VendorId};

/// Result type for cache operations
pub type CacheResult<T> = Result<T, DomainError>;

/// Reply presence filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFilter {
    #[default]
    Any,
    WithReply,
    WithoutReply,
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    /// Newest first, the remote store's native order
    #[default]
    Newest,
    Oldest,
    HighestRated,
    LowestRated,
    MostHelpful,
}

/// Query options for cached review listings
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    /// Only reviews in this star bucket (1-5)
    pub star: Option<u8>,
    pub reply: ReplyFilter,
    /// Case-insensitive substring over review text and customer name
    pub search: Option<String>,
    pub flagged_only: bool,
    pub sort: ReviewSort,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl ReviewFilter {
    /// Largest page the cache will return in one call
    pub const MAX_LIMIT: i64 = 500;

    pub fn with_star(mut self, star: u8) -> Self {
        self.star = Some(star);
        self
    }

    pub fn with_reply(mut self, reply: ReplyFilter) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn flagged_only(mut self) -> Self {
        self.flagged_only = true;
        self
    }

    pub fn sorted_by(mut self, sort: ReviewSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = offset.max(0);
        self
    }

    /// Search text with surrounding whitespace removed; blank means no search
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Page size clamped to `1..=MAX_LIMIT`
    pub fn effective_limit(&self) -> Option<i64> {
        self.limit.map(|l| l.clamp(1, Self::MAX_LIMIT))
    }
}

#[async_trait]
pub trait LocalReviewCache: Send + Sync {
    /// List the vendor's visible reviews matching `filter`
    async fn list_active(
        &self,
        vendor_id: &VendorId,
        filter: &ReviewFilter,
    ) -> CacheResult<Vec<ReviewRecord>>;

    /// Fetch one cached review regardless of status
    async fn get_review(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
    ) -> CacheResult<Option<ReviewRecord>>;

    /// Fetch the cached aggregate, if any
    async fn get_aggregate(&self, vendor_id: &VendorId)
        -> CacheResult<Option<VendorReviewAggregate>>;

    /// Fetch the cached aggregate, or a zero-valued one if none is cached
    async fn get_or_default_aggregate(
        &self,
        vendor_id: &VendorId,
    ) -> CacheResult<VendorReviewAggregate> {
        Ok(self
            .get_aggregate(vendor_id)
            .await?
            .unwrap_or_else(|| VendorReviewAggregate::empty(vendor_id.clone())))
    }

    /// Atomically replace every cached review of the vendor
    async fn replace_all(
        &self,
        vendor_id: &VendorId,
        records: &[ReviewRecord],
        synced_at: DateTime<Utc>,
    ) -> CacheResult<()>;

    /// Insert or replace a single review, leaving other rows untouched
    async fn upsert_one(&self, record: &ReviewRecord, synced_at: DateTime<Utc>) -> CacheResult<()>;

    /// Store the vendor's aggregate
    async fn set_aggregate(&self, aggregate: &VendorReviewAggregate) -> CacheResult<()>;

    /// When the vendor's reviews were last fully pulled
    async fn last_pulled_at(&self, vendor_id: &VendorId) -> CacheResult<Option<DateTime<Utc>>>;

    /// Cached reviews not confirmed since `older_than`
    async fn stale_reviews(
        &self,
        vendor_id: &VendorId,
        older_than: DateTime<Utc>,
    ) -> CacheResult<Vec<ReviewId>>;
}

//! Shared fixtures for service unit tests

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use review_cache::{CachePoolConfig, SqliteReviewCache};
use review_core::{CustomerId, ManualClock, ReviewId, ReviewRecord, VendorId, VendorIdentity};
use review_remote::InMemoryReviewStore;

use super::context::{ServiceContext, SyncSettings};

pub(crate) fn base_time() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_760_000_000_000).unwrap()
}

pub(crate) fn vendor() -> VendorId {
    VendorId::new("vendor-1")
}

pub(crate) fn review(id: &str, rating: f64, days_ago: i64) -> ReviewRecord {
    ReviewRecord::new(
        ReviewId::new(id),
        vendor(),
        CustomerId::new(format!("customer-{id}")),
        format!("Customer {id}"),
        rating,
        format!("Review {id}"),
        base_time() - chrono::Duration::days(days_ago),
    )
}

pub(crate) struct Harness {
    pub ctx: ServiceContext,
    pub remote: InMemoryReviewStore,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub async fn seed(&self, records: &[ReviewRecord]) {
        for record in records {
            self.remote.seed_review(record).await;
        }
    }

    /// Another signed-in context with its own cache over the same remote store
    pub async fn second_device(&self) -> ServiceContext {
        context(&self.remote, self.clock.clone()).await
    }
}

async fn context(remote: &InMemoryReviewStore, clock: Arc<ManualClock>) -> ServiceContext {
    let cache = SqliteReviewCache::connect(&CachePoolConfig::in_memory())
        .await
        .unwrap();

    let ctx = ServiceContext::builder()
        .remote(Arc::new(remote.clone()))
        .cache(Arc::new(cache))
        .clock(clock)
        .settings(SyncSettings {
            remote_timeout: Duration::from_millis(200),
            ..SyncSettings::default()
        })
        .build()
        .unwrap();
    ctx.sign_in(VendorIdentity::new(vendor(), "Taco Van"));
    ctx
}

/// Context over an in-memory remote and cache, signed in as `vendor()`
pub(crate) async fn harness() -> Harness {
    let remote = InMemoryReviewStore::new();
    let clock = Arc::new(ManualClock::new(base_time()));
    let ctx = context(&remote, clock.clone()).await;

    Harness { ctx, remote, clock }
}

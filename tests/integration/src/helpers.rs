//! Test helpers for integration tests
//!
//! Builds a signed-in service context backed by an in-memory remote store,
//! an in-memory SQLite cache and a manual clock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use review_cache::{CachePoolConfig, SqliteReviewCache};
use review_common::{try_init_tracing_with_config, TracingConfig};
use review_core::{ManualClock, ReviewRecord, VendorId, VendorIdentity, VendorReviewAggregate};
use review_remote::InMemoryReviewStore;
use review_service::{ServiceContext, SyncCoordinator, SyncSettings};

use crate::fixtures::{base_time, unique_vendor};

/// Remote timeout used by every test context
pub const TEST_REMOTE_TIMEOUT: Duration = Duration::from_millis(250);

/// Everything one test needs
pub struct TestHarness {
    pub ctx: ServiceContext,
    pub remote: InMemoryReviewStore,
    pub cache: Arc<SqliteReviewCache>,
    pub clock: Arc<ManualClock>,
    pub vendor: VendorId,
}

impl TestHarness {
    /// Start a harness for a fresh vendor, signed in as that vendor
    pub async fn start() -> Result<Self> {
        init_test_tracing();

        let remote = InMemoryReviewStore::new();
        let cache = Arc::new(SqliteReviewCache::connect(&CachePoolConfig::in_memory()).await?);
        let clock = Arc::new(ManualClock::new(base_time()));
        let vendor = unique_vendor();
        let ctx = device_context(&remote, cache.clone(), clock.clone(), &vendor)?;

        Ok(Self {
            ctx,
            remote,
            cache,
            clock,
            vendor,
        })
    }

    /// A second device: its own cache, the same remote store, clock and vendor
    pub async fn second_device(&self) -> Result<ServiceContext> {
        let cache = Arc::new(SqliteReviewCache::connect(&CachePoolConfig::in_memory()).await?);
        device_context(&self.remote, cache, self.clock.clone(), &self.vendor)
    }

    /// Store reviews remotely as customers would
    pub async fn seed(&self, records: &[ReviewRecord]) {
        for record in records {
            self.remote.seed_review(record).await;
        }
    }

    /// Seed reviews, store their recomputed aggregate remotely, and pull both
    pub async fn seed_and_refresh(&self, records: &[ReviewRecord]) -> Result<VendorReviewAggregate> {
        self.seed(records).await;
        let aggregate = self
            .ctx
            .aggregation()
            .recompute_from_scratch(&self.vendor, records, base_time());
        self.remote.seed_aggregate(&aggregate).await;

        let summary = SyncCoordinator::new(&self.ctx).refresh(&self.vendor).await?;
        Ok(summary.aggregate)
    }
}

fn device_context(
    remote: &InMemoryReviewStore,
    cache: Arc<SqliteReviewCache>,
    clock: Arc<ManualClock>,
    vendor: &VendorId,
) -> Result<ServiceContext> {
    let ctx = ServiceContext::builder()
        .remote(Arc::new(remote.clone()))
        .cache(cache)
        .clock(clock)
        .settings(SyncSettings {
            remote_timeout: TEST_REMOTE_TIMEOUT,
            ..SyncSettings::default()
        })
        .build()?;
    ctx.sign_in(VendorIdentity::new(vendor.clone(), "Test Van"));
    Ok(ctx)
}

/// Install a test subscriber once; later calls are no-ops
pub fn init_test_tracing() {
    let _ = try_init_tracing_with_config(&TracingConfig::development());
}

/// Assert two floats agree to within `1e-3`
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

//! Service context - dependency container for services
//!
//! Holds the remote store, the local cache, the clock, sync settings and the
//! signed-in vendor identity.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};

use review_cache::{CachePoolConfig, SqliteReviewCache};
use review_common::{AppConfig, SyncConfig};
use review_core::traits::{Clock, LocalReviewCache, RemoteResult, RemoteReviewStore, SystemClock};
use review_core::{
    AggregationEngine, ModerationStateMachine, RemoteFailure, VendorId, VendorIdentity,
};

use super::error::{ServiceError, ServiceResult};
use super::locks::{ReviewLocks, VendorLocks};

/// Timing knobs for the sync layer
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    /// Upper bound on every remote round-trip
    pub remote_timeout: Duration,
    /// Age after which a vendor's cached reviews are pulled again
    pub stale_after: chrono::Duration,
    /// Rolling statistics window
    pub stats_window: chrono::Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            remote_timeout: config.remote_timeout(),
            stale_after: config.stale_after(),
            stats_window: config.stats_window(),
        }
    }
}

/// Service context containing all dependencies
///
/// Cloning is cheap; clones share the identity slot and the lock tables.
#[derive(Clone)]
pub struct ServiceContext {
    remote: Arc<dyn RemoteReviewStore>,
    cache: Arc<dyn LocalReviewCache>,
    clock: Arc<dyn Clock>,
    settings: SyncSettings,
    identity: Arc<RwLock<Option<VendorIdentity>>>,
    locks: ReviewLocks,
    aggregate_locks: VendorLocks,
    aggregation: AggregationEngine,
    moderation: ModerationStateMachine,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        remote: Arc<dyn RemoteReviewStore>,
        cache: Arc<dyn LocalReviewCache>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            remote,
            cache,
            clock,
            aggregation: AggregationEngine::with_window(settings.stats_window),
            settings,
            identity: Arc::new(RwLock::new(None)),
            locks: ReviewLocks::new(),
            aggregate_locks: VendorLocks::new(),
            moderation: ModerationStateMachine::new(),
        }
    }

    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Open the SQLite cache described by `config` and wire it to `remote`
    ///
    /// # Errors
    /// Returns `ServiceError::Cache` if the cache database cannot be opened
    pub async fn connect(
        config: &AppConfig,
        remote: Arc<dyn RemoteReviewStore>,
    ) -> ServiceResult<Self> {
        let cache = SqliteReviewCache::connect(&CachePoolConfig::from(&config.cache))
            .await
            .map_err(|e| ServiceError::Cache(e.to_string()))?;

        info!(
            app = %config.app.name,
            cache_url = %config.cache.url,
            "Review service context ready"
        );

        ServiceContextBuilder::new()
            .remote(remote)
            .cache(Arc::new(cache))
            .settings(SyncSettings::from(&config.sync))
            .build()
    }

    // === Ports ===

    /// Get the remote review store
    pub fn remote(&self) -> &dyn RemoteReviewStore {
        self.remote.as_ref()
    }

    /// Get the local review cache
    pub fn cache(&self) -> &dyn LocalReviewCache {
        self.cache.as_ref()
    }

    /// Current time according to the context's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // === Domain logic ===

    pub fn aggregation(&self) -> &AggregationEngine {
        &self.aggregation
    }

    pub fn moderation(&self) -> &ModerationStateMachine {
        &self.moderation
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn locks(&self) -> &ReviewLocks {
        &self.locks
    }

    /// Locks held around every aggregate read-modify-write
    pub fn aggregate_locks(&self) -> &VendorLocks {
        &self.aggregate_locks
    }

    // === Identity ===

    /// Act as `identity` for subsequent mutations
    pub fn sign_in(&self, identity: VendorIdentity) {
        info!(vendor_id = %identity.vendor_id, "Vendor signed in");
        *self.identity.write() = Some(identity);
    }

    /// Forget the signed-in vendor
    pub fn sign_out(&self) {
        if let Some(previous) = self.identity.write().take() {
            info!(vendor_id = %previous.vendor_id, "Vendor signed out");
        }
    }

    /// The signed-in vendor, if any
    pub fn identity(&self) -> Option<VendorIdentity> {
        self.identity.read().clone()
    }

    /// Require a signed-in vendor that owns `vendor_id`
    ///
    /// # Errors
    /// Returns `ServiceError::NotAuthenticated` when nobody is signed in or
    /// the signed-in vendor is a different one
    pub fn require_identity(&self, vendor_id: &VendorId) -> ServiceResult<VendorIdentity> {
        match self.identity() {
            Some(identity) if identity.owns(vendor_id) => Ok(identity),
            Some(identity) => Err(ServiceError::not_authenticated(format!(
                "signed in as {}, not {vendor_id}",
                identity.vendor_id
            ))),
            None => Err(ServiceError::not_authenticated("no vendor is signed in")),
        }
    }

    /// Run a remote call under the configured timeout
    pub(crate) async fn remote_call<T, F>(&self, operation: &'static str, call: F) -> ServiceResult<T>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        match tokio::time::timeout(self.settings.remote_timeout, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => {
                warn!(
                    operation,
                    timeout = ?self.settings.remote_timeout,
                    "Remote call timed out"
                );
                Err(ServiceError::RemoteUnavailable(RemoteFailure::Timeout))
            }
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("remote", &"RemoteReviewStore")
            .field("cache", &"LocalReviewCache")
            .field("settings", &self.settings)
            .field("identity", &self.identity())
            .field("locks", &self.locks)
            .field("aggregate_locks", &self.aggregate_locks)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    remote: Option<Arc<dyn RemoteReviewStore>>,
    cache: Option<Arc<dyn LocalReviewCache>>,
    clock: Option<Arc<dyn Clock>>,
    settings: Option<SyncSettings>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteReviewStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn LocalReviewCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Defaults to the system clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn settings(mut self, settings: SyncSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if the remote store or cache is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.remote
                .ok_or_else(|| ServiceError::validation("remote store is required"))?,
            self.cache
                .ok_or_else(|| ServiceError::validation("cache is required"))?,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.settings.unwrap_or_default(),
        ))
    }
}

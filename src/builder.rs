//! Builder API for assembling an [`SwrCache`].

use std::sync::Arc;
use std::time::Duration;

use crate::background::{Detach, TaskTracker};
use crate::fingerprint::DEFAULT_KEY_PREFIX;
use crate::origin::Origin;
use crate::store::Store;
use crate::stores::memory::{HashMapStore, HashMapStoreConfig};
use crate::swr::SwrCache;
use crate::tiered::TieredStore;

/// How long payloads stay in the store and in downstream caches: one year.
pub const DEFAULT_STORAGE_TTL: Duration = Duration::from_secs(31_556_926);

/// Name of the diagnostic header carrying `hit`, `stale` or `miss`.
pub const DEFAULT_STATUS_HEADER: &str = "x-swr-cache";

/// Settings shared by every request served through one cache.
#[derive(Debug, Clone)]
pub struct SwrCacheConfig {
    /// Private prefix under which both keys of a fingerprint live.
    pub key_prefix: String,

    /// TTL of payload entries, also advertised as `cache-control: max-age`.
    /// A garbage-collection bound, unrelated to freshness.
    pub storage_ttl: Duration,

    /// Header that reports which path served the response.
    pub status_header: String,
}

impl Default for SwrCacheConfig {
    fn default() -> Self {
        SwrCacheConfig {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            storage_ttl: DEFAULT_STORAGE_TTL,
            status_header: DEFAULT_STATUS_HEADER.to_string(),
        }
    }
}

/// Builder for [`SwrCache`].
///
/// Stores added with [`store`](Self::store) are checked in order; more than
/// one store is wrapped in a [`TieredStore`]. Without any store an in-memory
/// [`HashMapStore`] is used. Without a [`Detach`], revalidations go to a
/// [`TaskTracker`] owned by the cache; await them with
/// [`SwrCache::wait_background`].
///
/// # Example
///
/// ```ignore
/// use swr_http_cache::{MokaStore, MokaStoreConfig, ReqwestOrigin, SwrCacheBuilder, TaskTracker};
/// use std::sync::Arc;
///
/// let tracker = TaskTracker::new();
/// let cache = SwrCacheBuilder::new(Arc::new(ReqwestOrigin::new()))
///     .store(Arc::new(MokaStore::new(MokaStoreConfig::default())))
///     .detach(Arc::new(tracker.clone()))
///     .build();
///
/// let response = cache.serve(request, 60).await?;
/// ```
pub struct SwrCacheBuilder {
    origin: Arc<dyn Origin>,
    stores: Vec<Arc<dyn Store>>,
    detach: Option<Arc<dyn Detach>>,
    config: SwrCacheConfig,
}

impl SwrCacheBuilder {
    /// Create a new SwrCacheBuilder for the given origin.
    pub fn new(origin: Arc<dyn Origin>) -> Self {
        SwrCacheBuilder {
            origin,
            stores: Vec::new(),
            detach: None,
            config: SwrCacheConfig::default(),
        }
    }

    /// Add a store tier.
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.stores.push(store);
        self
    }

    /// Set the executor for background revalidation.
    pub fn detach(mut self, detach: Arc<dyn Detach>) -> Self {
        self.detach = Some(detach);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SwrCacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    pub fn storage_ttl(mut self, ttl: Duration) -> Self {
        self.config.storage_ttl = ttl;
        self
    }

    pub fn status_header(mut self, name: impl Into<String>) -> Self {
        self.config.status_header = name.into();
        self
    }

    /// Build the cache.
    pub fn build(self) -> SwrCache {
        let mut stores = self.stores;
        let store: Arc<dyn Store> = match stores.len() {
            0 => Arc::new(HashMapStore::new(HashMapStoreConfig::default())),
            1 => stores.remove(0),
            _ => Arc::new(TieredStore::from_stores(stores)),
        };
        let detach = self
            .detach
            .unwrap_or_else(|| Arc::new(TaskTracker::new()));

        SwrCache::new(self.origin, store, detach, self.config)
    }
}

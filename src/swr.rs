use http::header::CACHE_CONTROL;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::background::Detach;
use crate::builder::SwrCacheConfig;
use crate::entry::Entry;
use crate::error::CacheError;
use crate::fingerprint::{CacheKeys, fingerprint};
use crate::freshness::FreshnessTracker;
use crate::origin::Origin;
use crate::request::{HttpResponse, OriginRequest};
use crate::store::{CacheStore, Store};

/// Which path served a response. Reported in the diagnostic header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Payload and freshness marker were both present.
    Hit,
    /// Payload present, marker gone: served as is and revalidated in the background.
    Stale,
    /// No payload: fetched from the origin on the response path.
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Stale => "stale",
            CacheStatus::Miss => "miss",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stale-while-revalidate cache in front of an [`Origin`].
///
/// Every fingerprint owns two keys: the payload, kept for the long storage
/// TTL, and a freshness marker kept for the caller's max age. Presence of the
/// marker means fresh. The cache is cheap to clone; clones share the store,
/// origin and background executor.
///
/// There is no request coalescing: concurrent stale reads of one fingerprint
/// each start their own revalidation. The writes are idempotent, so the store
/// still converges on the latest successful origin response.
#[derive(Clone)]
pub struct SwrCache {
    origin: Arc<dyn Origin>,
    store: CacheStore,
    freshness: FreshnessTracker,
    detach: Arc<dyn Detach>,
    config: SwrCacheConfig,
}

impl SwrCache {
    /// Create a new SWR cache.
    ///
    /// # Arguments
    /// * `origin` - The upstream fetch
    /// * `store` - Where payloads and freshness markers live
    /// * `detach` - Runs revalidations off the response path
    /// * `config` - Key prefix, storage TTL and diagnostic header name
    pub fn new(
        origin: Arc<dyn Origin>,
        store: Arc<dyn Store>,
        detach: Arc<dyn Detach>,
        config: SwrCacheConfig,
    ) -> Self {
        let store = CacheStore::new(store);
        SwrCache {
            origin,
            freshness: FreshnessTracker::new(store.clone()),
            store,
            detach,
            config,
        }
    }

    pub fn config(&self) -> &SwrCacheConfig {
        &self.config
    }

    /// Wait until the revalidations started so far have finished.
    ///
    /// Resolves immediately when the executor does not track its tasks, as
    /// with a bare [`tokio::runtime::Handle`].
    pub async fn wait_background(&self) {
        self.detach.wait_idle().await;
    }

    /// The payload and freshness keys a request maps to.
    pub fn keys_for(&self, request: &OriginRequest) -> CacheKeys {
        CacheKeys::new(&self.config.key_prefix, &fingerprint(request))
    }

    /// Serve `request`, going straight to the origin when it is flagged to
    /// bypass the cache.
    ///
    /// A bypassed response is returned exactly as the origin sent it.
    pub async fn fetch(
        &self,
        request: OriginRequest,
        max_age_secs: u64,
    ) -> Result<HttpResponse, CacheError> {
        if request.bypass() {
            tracing::debug!(url = %request.url(), "cache bypassed");
            return self.origin.fetch(request).await;
        }
        self.serve(request, max_age_secs).await
    }

    /// Stale-while-revalidate: return the cached response or load it from origin.
    ///
    /// - Payload and marker present: return the payload (`hit`)
    /// - Payload present, marker gone: return the payload and revalidate in the
    ///   background (`stale`)
    /// - Payload missing: fetch from origin now and cache a `200` (`miss`)
    ///
    /// Store failures read as misses. Only a failed origin fetch on the miss
    /// path is returned as an error.
    pub async fn serve(
        &self,
        request: OriginRequest,
        max_age_secs: u64,
    ) -> Result<HttpResponse, CacheError> {
        if max_age_secs == 0 {
            return Err(CacheError::InvalidMaxAge(max_age_secs));
        }
        let max_age = Duration::from_secs(max_age_secs);
        let keys = self.keys_for(&request);

        let (payload, fresh) = tokio::join!(
            self.store.get(&keys.payload),
            self.freshness.is_fresh(&keys)
        );

        let (response, status) = match payload {
            Some(entry) if fresh => (entry.response, CacheStatus::Hit),
            Some(entry) => {
                self.spawn_revalidation(keys.clone(), request, max_age);
                (entry.response, CacheStatus::Stale)
            }
            None => {
                let response = self.origin.fetch(request).await?;
                if response.is_cacheable() {
                    self.write_through(&keys, response.clone(), max_age).await;
                } else {
                    tracing::debug!(
                        key = %keys.payload,
                        status = response.status,
                        "origin response not cached"
                    );
                }
                (response, CacheStatus::Miss)
            }
        };

        tracing::debug!(key = %keys.payload, status = %status, "served");
        Ok(self.decorate(response, status))
    }

    /// Re-fetch from origin and, on `200`, replace the payload and the marker.
    ///
    /// Never fails: errors and non-`200` responses are logged and the previous
    /// payload stays in place for the next stale read to try again.
    pub async fn revalidate(&self, keys: &CacheKeys, request: OriginRequest, max_age: Duration) {
        let url = request.url().to_string();

        match self.origin.fetch(request).await {
            Ok(response) if response.is_cacheable() => {
                if self.write_through(keys, response, max_age).await {
                    tracing::debug!(key = %keys.payload, url = %url, "revalidated");
                }
            }
            Ok(response) => {
                tracing::debug!(
                    key = %keys.payload,
                    url = %url,
                    status = response.status,
                    "revalidation not cacheable, keeping stale payload"
                );
            }
            Err(e) => {
                tracing::warn!(
                    key = %keys.payload,
                    url = %url,
                    error = %e,
                    "revalidation failed, keeping stale payload"
                );
            }
        }
    }

    /// Hand a revalidation to the background executor.
    fn spawn_revalidation(&self, keys: CacheKeys, request: OriginRequest, max_age: Duration) {
        let cache = self.clone();
        self.detach.detach(Box::pin(async move {
            cache.revalidate(&keys, request, max_age).await;
        }));
    }

    /// Write the payload, then the marker. Returns whether both landed.
    ///
    /// The marker is skipped when the payload write fails, so a reader that
    /// sees the marker always finds a payload.
    async fn write_through(
        &self,
        keys: &CacheKeys,
        response: HttpResponse,
        max_age: Duration,
    ) -> bool {
        let storage_ttl = self.config.storage_ttl;
        if !self
            .store
            .put(&keys.payload, Entry::new(response, storage_ttl), storage_ttl)
            .await
        {
            return false;
        }
        self.freshness.mark_fresh(keys, max_age).await
    }

    fn decorate(&self, mut response: HttpResponse, status: CacheStatus) -> HttpResponse {
        response.set_header(&self.config.status_header, status.as_str());
        response.set_header(
            CACHE_CONTROL.as_str(),
            format!("max-age={}", self.config.storage_ttl.as_secs()),
        );
        response
    }
}

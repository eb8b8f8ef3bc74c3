use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::entry::Entry;
use crate::error::CacheError;

/// A store is a common interface for storing, reading and deleting entries
/// under opaque string keys.
///
/// The store implementation is responsible for expiring data on its own: once
/// an entry's TTL has elapsed, `get` must no longer return it. Implementations
/// must tolerate concurrent access to independent keys.
#[async_trait]
pub trait Store: Send + Sync {
    /// A name for metrics/tracing.
    ///
    /// # Example
    /// - "hashmap"
    /// - "redis"
    /// - "tiered"
    fn name(&self) -> &'static str;

    /// Return the cached entry.
    ///
    /// The response must be `None` for cache misses and for expired entries.
    async fn get(&self, key: &str) -> Result<Option<Entry>, CacheError>;

    /// Store the entry for the given key, replacing any previous entry.
    ///
    /// `ttl` is how long the entry stays reachable.
    async fn put(&self, key: &str, entry: Entry, ttl: Duration) -> Result<(), CacheError>;

    /// Removes the key(s) from the store.
    async fn remove(&self, keys: &[&str]) -> Result<(), CacheError>;
}

/// Best-effort view of a [`Store`].
///
/// The cache is an availability optimization: a failing store must never fail
/// a request. Read errors read as "absent" and write errors are only logged.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<dyn Store>,
}

impl CacheStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        CacheStore { inner }
    }

    /// The underlying store.
    pub fn inner(&self) -> &Arc<dyn Store> {
        &self.inner
    }

    /// Return the entry, or `None` when it is missing or the read failed.
    pub async fn get(&self, key: &str) -> Option<Entry> {
        match self.inner.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(
                    tier = self.inner.name(),
                    key,
                    error = %e,
                    "cache read failed, treating as absent"
                );
                None
            }
        }
    }

    /// Write the entry. Returns whether the write succeeded.
    pub async fn put(&self, key: &str, entry: Entry, ttl: Duration) -> bool {
        match self.inner.put(key, entry, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    tier = self.inner.name(),
                    key,
                    error = %e,
                    "cache write failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpResponse;

    struct BrokenStore;

    #[async_trait]
    impl Store for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, key: &str) -> Result<Option<Entry>, CacheError> {
            Err(CacheError::operation("broken", key, "connection reset"))
        }

        async fn put(&self, key: &str, _entry: Entry, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::operation("broken", key, "connection reset"))
        }

        async fn remove(&self, _keys: &[&str]) -> Result<(), CacheError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_absent() {
        let store = CacheStore::new(Arc::new(BrokenStore));
        assert!(store.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let store = CacheStore::new(Arc::new(BrokenStore));
        let ttl = Duration::from_secs(60);
        let ok = store
            .put("k", Entry::new(HttpResponse::new(200, "A"), ttl), ttl)
            .await;
        assert!(!ok);
    }
}

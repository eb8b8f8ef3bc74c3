use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::entry::Entry;
use crate::error::CacheError;
use crate::store::Store;

use crate::utils::{expires_at, now_ms, rand_simple};

/// Configuration for eviction on set operations.
#[derive(Debug, Clone)]
pub struct EvictOnSetConfig {
    /// Provide a number between 0 and 1 to calculate whether eviction should run on each put.
    ///
    /// - `1.0` -> run eviction on every `put`
    /// - `0.5` -> run eviction on every 2nd `put` (on average)
    /// - `0.0` -> disable eviction
    pub frequency: f64,

    /// Remove items until the number of items in the map is lower than `max_items`.
    pub max_items: usize,
}

/// Configuration for HashMapStore.
#[derive(Debug, Clone, Default)]
pub struct HashMapStoreConfig {
    /// Remove expired entries on every `put` operation.
    pub evict_on_set: Option<EvictOnSetConfig>,
}

/// Thread-safe in-memory cache store using HashMap with RwLock.
///
/// Expired keys are never returned; they are dropped lazily on read and,
/// when configured, swept on `put`.
///
/// For high-concurrency scenarios, consider using `MokaStore` instead.
pub struct HashMapStore {
    state: RwLock<HashMap<String, Entry>>,
    evict_on_set: Option<EvictOnSetConfig>,
}

impl HashMapStore {
    /// Create a new HashMapStore with the given configuration.
    pub fn new(config: HashMapStoreConfig) -> Self {
        HashMapStore {
            state: RwLock::new(HashMap::new()),
            evict_on_set: config.evict_on_set,
        }
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }

    /// Run eviction if configured and random check passes.
    async fn maybe_evict(&self) {
        let Some(ref config) = self.evict_on_set else {
            return;
        };

        // Check frequency
        if config.frequency <= 0.0 {
            return;
        }

        let should_evict = if config.frequency >= 1.0 {
            true
        } else {
            rand_simple() < config.frequency
        };

        if !should_evict {
            return;
        }

        let mut state = self.state.write().await;
        let now = now_ms();

        // First delete all expired entries
        state.retain(|_, v| !v.is_expired(now));

        // If still over max_items, remove the ones closest to expiry
        if state.len() > config.max_items {
            let mut entries: Vec<_> = state
                .iter()
                .map(|(k, v)| (k.clone(), v.expires_at))
                .collect();
            entries.sort_by_key(|(_, expires)| *expires);

            let to_remove = state.len() - config.max_items;
            for (key, _) in entries.into_iter().take(to_remove) {
                state.remove(&key);
            }
        }
    }
}

#[async_trait]
impl Store for HashMapStore {
    fn name(&self) -> &'static str {
        "hashmap"
    }

    async fn get(&self, key: &str) -> Result<Option<Entry>, CacheError> {
        let state = self.state.read().await;

        let Some(entry) = state.get(key) else {
            return Ok(None);
        };

        if entry.is_expired(now_ms()) {
            // Entry is expired, remove it unless a fresh put raced us
            drop(state);
            let mut state = self.state.write().await;
            if state.get(key).is_some_and(|e| e.is_expired(now_ms())) {
                state.remove(key);
            }
            return Ok(None);
        }

        Ok(Some(entry.clone()))
    }

    async fn put(&self, key: &str, mut entry: Entry, ttl: Duration) -> Result<(), CacheError> {
        entry.expires_at = expires_at(now_ms(), ttl);

        {
            let mut state = self.state.write().await;
            state.insert(key.to_string(), entry);
        }

        self.maybe_evict().await;
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), CacheError> {
        let mut state = self.state.write().await;

        for key in keys {
            state.remove(*key);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpResponse;

    fn entry(body: &'static str) -> Entry {
        Entry::new(HttpResponse::new(200, body), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_get_put_remove() {
        let store = HashMapStore::new(HashMapStoreConfig::default());

        // Initially empty
        let result = store.get("key1").await.unwrap();
        assert!(result.is_none());

        store
            .put("key1", entry("value1"), Duration::from_secs(300))
            .await
            .unwrap();

        let result = store.get("key1").await.unwrap();
        assert_eq!(result.unwrap().response.body, "value1");

        store.remove(&["key1"]).await.unwrap();

        let result = store.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_entry_unreachable_after_ttl() {
        let store = HashMapStore::new(HashMapStoreConfig::default());

        store
            .put("key1", entry("value1"), Duration::from_millis(20))
            .await
            .unwrap();
        assert!(store.get("key1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(store.get("key1").await.unwrap().is_none());
        // Lazily dropped on read
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_evict_on_set_caps_size() {
        let store = HashMapStore::new(HashMapStoreConfig {
            evict_on_set: Some(EvictOnSetConfig {
                frequency: 1.0,
                max_items: 2,
            }),
        });

        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            store
                .put(key, entry("v"), Duration::from_secs(60 + i as u64))
                .await
                .unwrap();
        }

        assert_eq!(store.len().await, 2);
        // The entry closest to expiry goes first
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
    }
}

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::entry::Entry;
use crate::error::CacheError;
use crate::store::Store;
use crate::utils::now_ms;

/// TieredStore is a store that checks multiple stores in order.
///
/// Stores are checked in the order they are provided.
/// The first store to return an entry is used to populate all previous stores,
/// with whatever TTL the entry has left so that freshness markers keep their
/// original expiry.
pub struct TieredStore {
    tiers: Vec<Arc<dyn Store>>,
}

impl TieredStore {
    /// Create a new tiered store.
    ///
    /// `stores` can accept `None` as members to allow you to construct the tiers dynamically.
    ///
    /// # Example
    /// ```ignore
    /// TieredStore::new(vec![
    ///     Some(Arc::new(memory_store)),
    ///     if enable_redis { Some(Arc::new(redis_store)) } else { None },
    /// ])
    /// ```
    pub fn new(stores: Vec<Option<Arc<dyn Store>>>) -> Self {
        let tiers = stores.into_iter().flatten().collect();
        TieredStore { tiers }
    }

    /// Create a tiered store from a vec of stores (no optional filtering).
    pub fn from_stores(stores: Vec<Arc<dyn Store>>) -> Self {
        TieredStore { tiers: stores }
    }
}

#[async_trait]
impl Store for TieredStore {
    fn name(&self) -> &'static str {
        "tiered"
    }

    async fn get(&self, key: &str) -> Result<Option<Entry>, CacheError> {
        for (i, tier) in self.tiers.iter().enumerate() {
            let Some(entry) = tier.get(key).await? else {
                continue;
            };

            // Fill all lower (earlier) tiers with this entry in the background
            if i > 0
                && let Some(ttl) = entry.remaining_ttl(now_ms())
            {
                let lower_tiers: Vec<_> = self.tiers[..i].to_vec();
                let entry_clone = entry.clone();
                let key_clone = key.to_string();

                tokio::spawn(async move {
                    for tier in lower_tiers {
                        match tier.put(&key_clone, entry_clone.clone(), ttl).await {
                            Ok(_) => {
                                tracing::debug!(
                                    "Successfully populated lower tier: tier={}, key={}",
                                    tier.name(),
                                    key_clone
                                );
                            }
                            Err(e) => {
                                tracing::warn!(
                                    "Failed to populate lower tier: tier={}, key={}, error={}",
                                    tier.name(),
                                    key_clone,
                                    e
                                );
                            }
                        }
                    }
                });
            }

            return Ok(Some(entry));
        }

        Ok(None)
    }

    async fn put(&self, key: &str, entry: Entry, ttl: Duration) -> Result<(), CacheError> {
        // Put on all tiers in parallel
        let futures: Vec<_> = self
            .tiers
            .iter()
            .map(|tier| tier.put(key, entry.clone(), ttl))
            .collect();

        let results = join_all(futures).await;

        // Return first error if any
        for result in results {
            result?;
        }

        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), CacheError> {
        let futures: Vec<_> = self.tiers.iter().map(|tier| tier.remove(keys)).collect();

        let results = join_all(futures).await;

        for result in results {
            result?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpResponse;
    use crate::stores::memory::{HashMapStore, HashMapStoreConfig};

    #[tokio::test]
    async fn test_tiered_get_populates_lower_tiers() {
        let l1: Arc<dyn Store> = Arc::new(HashMapStore::new(HashMapStoreConfig::default()));
        let l2: Arc<dyn Store> = Arc::new(HashMapStore::new(HashMapStoreConfig::default()));

        // Put entry only in L2
        let ttl = Duration::from_secs(300);
        let entry = Entry::new(HttpResponse::new(200, "value1"), ttl);
        l2.put("key1", entry, ttl).await.unwrap();

        assert!(l1.get("key1").await.unwrap().is_none());

        let tiered = TieredStore::from_stores(vec![l1.clone(), l2.clone()]);

        // Get from tiered - should find in L2
        let result = tiered.get("key1").await.unwrap();
        assert_eq!(result.unwrap().response.body, "value1");

        // Give background task time to populate L1
        tokio::time::sleep(Duration::from_millis(50)).await;

        let populated = l1.get("key1").await.unwrap().unwrap();
        assert_eq!(populated.response.body, "value1");
        // Back-filled with the remaining TTL, not a fresh one
        assert!(populated.expires_at <= now_ms() + 300_000);
    }

    #[tokio::test]
    async fn test_tiered_put_writes_all_tiers() {
        let l1: Arc<dyn Store> = Arc::new(HashMapStore::new(HashMapStoreConfig::default()));
        let l2: Arc<dyn Store> = Arc::new(HashMapStore::new(HashMapStoreConfig::default()));
        let tiered = TieredStore::new(vec![Some(l1.clone()), None, Some(l2.clone())]);

        let ttl = Duration::from_secs(60);
        tiered.put("k", Entry::marker(ttl), ttl).await.unwrap();

        assert!(l1.get("k").await.unwrap().is_some());
        assert!(l2.get("k").await.unwrap().is_some());

        tiered.remove(&["k"]).await.unwrap();
        assert!(l1.get("k").await.unwrap().is_none());
        assert!(l2.get("k").await.unwrap().is_none());
    }
}

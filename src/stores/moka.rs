use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};

use crate::entry::Entry;
use crate::error::CacheError;
use crate::store::Store;
use crate::utils::{capped_ttl, expires_at, now_ms};

/// Configuration for MokaStore.
#[derive(Debug, Clone)]
pub struct MokaStoreConfig {
    /// Maximum number of entries the cache can hold.
    pub max_capacity: u64,

    /// Time to idle: entries are expired if not accessed within this duration,
    /// even when their own TTL has not elapsed yet.
    /// `None` means entries don't expire based on idle time.
    pub time_to_idle: Option<Duration>,
}

impl Default for MokaStoreConfig {
    fn default() -> Self {
        MokaStoreConfig {
            max_capacity: 10_000,
            time_to_idle: None,
        }
    }
}

#[derive(Clone)]
struct Slot {
    entry: Entry,
    ttl: Duration,
}

/// Per-entry expiry: every `put` restarts the clock with its own TTL.
struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Slot,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Slot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// High-performance concurrent cache store using Moka.
///
/// Each key carries its own TTL through moka's per-entry expiration, which is
/// what the freshness markers rely on. Capacity-based eviction is left to
/// moka.
pub struct MokaStore {
    cache: Cache<String, Slot>,
}

impl MokaStore {
    /// Create a new MokaStore with the given configuration.
    ///
    /// # Example
    /// ```ignore
    /// let config = MokaStoreConfig {
    ///     max_capacity: 10_000,
    ///     time_to_idle: Some(Duration::from_secs(3600)),
    /// };
    /// let store = MokaStore::new(config);
    /// ```
    pub fn new(config: MokaStoreConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(SlotExpiry);

        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        MokaStore {
            cache: builder.build(),
        }
    }

    /// Get cache statistics (for monitoring/debugging).
    pub fn stats(&self) -> (u64, u64) {
        let entry_count = self.cache.entry_count();
        let weighted_size = self.cache.weighted_size();
        (entry_count, weighted_size)
    }
}

#[async_trait]
impl Store for MokaStore {
    fn name(&self) -> &'static str {
        "moka"
    }

    async fn get(&self, key: &str) -> Result<Option<Entry>, CacheError> {
        // Expired slots are left for moka's own expiry to collect. Removing
        // them here could race with a put to the same key.
        Ok(self
            .cache
            .get(key)
            .await
            .map(|slot| slot.entry)
            .filter(|entry| !entry.is_expired(now_ms())))
    }

    async fn put(&self, key: &str, mut entry: Entry, ttl: Duration) -> Result<(), CacheError> {
        entry.expires_at = expires_at(now_ms(), ttl);
        let ttl = capped_ttl(ttl);
        self.cache.insert(key.to_string(), Slot { entry, ttl }).await;

        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), CacheError> {
        for key in keys {
            self.cache.invalidate(*key).await;
        }

        Ok(())
    }
}

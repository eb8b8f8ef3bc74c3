use std::time::Duration;

use crate::entry::Entry;
use crate::fingerprint::CacheKeys;
use crate::store::CacheStore;

/// Freshness by presence.
///
/// A fingerprint is fresh while its marker key is reachable. The marker is
/// written with TTL equal to the freshness window and the store expires it,
/// so no timestamp is ever compared here.
#[derive(Clone)]
pub struct FreshnessTracker {
    store: CacheStore,
}

impl FreshnessTracker {
    pub fn new(store: CacheStore) -> Self {
        FreshnessTracker { store }
    }

    /// Whether the freshness marker is present.
    pub async fn is_fresh(&self, keys: &CacheKeys) -> bool {
        self.store.get(&keys.freshness).await.is_some()
    }

    /// Write the freshness marker with TTL `max_age`.
    pub async fn mark_fresh(&self, keys: &CacheKeys, max_age: Duration) -> bool {
        self.store
            .put(&keys.freshness, Entry::marker(max_age), max_age)
            .await
    }
}

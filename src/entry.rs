use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::request::HttpResponse;
use crate::utils::{expires_at, now_ms};

/// A stored cache entry: a response plus the time after which the store must
/// no longer return it.
///
/// Both the payload and the freshness marker of a fingerprint are `Entry`
/// values; the marker simply carries an empty response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The cached response.
    pub response: HttpResponse,

    /// Unix timestamp in milliseconds at which the entry was written.
    pub stored_at: i64,

    /// Unix timestamp in milliseconds.
    /// Stores must treat the entry as absent from this point on.
    pub expires_at: i64,
}

impl Entry {
    /// Create an entry that expires `ttl` from now.
    pub fn new(response: HttpResponse, ttl: Duration) -> Self {
        let now = now_ms();
        Entry {
            response,
            stored_at: now,
            expires_at: expires_at(now, ttl),
        }
    }

    /// An empty entry whose presence alone carries meaning.
    pub fn marker(ttl: Duration) -> Self {
        Self::new(HttpResponse::empty(), ttl)
    }

    /// Check if the entry has expired and should not be returned.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    /// Time left before expiry, `None` once expired.
    pub fn remaining_ttl(&self, now_ms: i64) -> Option<Duration> {
        if self.is_expired(now_ms) {
            return None;
        }
        Some(Duration::from_millis((self.expires_at - now_ms) as u64))
    }
}

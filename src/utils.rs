//! Shared utilities for the cache library.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the current time in milliseconds since UNIX epoch.
///
/// A clock set before the epoch reads as `0`.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Longest TTL handed to a backend: roughly one hundred years.
///
/// Longer TTLs are accepted and treated as this one. Backends add the TTL to
/// their own clocks, which overflow well before `Duration::MAX`.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 31_556_926);

/// Clamp a TTL to [`MAX_TTL`].
pub fn capped_ttl(ttl: Duration) -> Duration {
    ttl.min(MAX_TTL)
}

/// Milliseconds in a TTL, saturating instead of wrapping.
pub fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Expiry timestamp in milliseconds for a TTL starting at `now_ms`.
pub fn expires_at(now_ms: i64, ttl: Duration) -> i64 {
    now_ms.saturating_add(ttl_millis(ttl))
}

/// Whole seconds for a TTL, never below one and never above [`MAX_TTL`].
///
/// Stores that only speak seconds (Redis `SET EX`) would reject or
/// immediately drop a zero TTL.
pub fn ttl_seconds(ttl: Duration) -> u64 {
    capped_ttl(ttl).as_secs().max(1)
}

/// Simple pseudo-random number generator (0.0 to 1.0).
/// This avoids adding a dependency on rand crate.
pub fn rand_simple() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let state = RandomState::new();
    let mut hasher = state.build_hasher();
    hasher.write_i64(now_ms());
    (hasher.finish() as f64) / (u64::MAX as f64)
}

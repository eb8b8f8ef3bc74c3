//! Metrics middleware for cache stores.
//!
//! This module provides a `MetricsStore` wrapper that emits metrics for all
//! store operations (reads, writes, removes) to a user-provided sink.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use swr_http_cache::{MokaStore, MokaStoreConfig, Store};
//! use swr_http_cache::{CacheMetric, MetricsSink, MetricsStore};
//!
//! // Create metrics sink
//! let sink = Arc::new(MyMetricsSink::new());
//!
//! // Wrap store with metrics
//! let moka = Arc::new(MokaStore::new(MokaStoreConfig::default()));
//! let store: Arc<dyn Store> = Arc::new(MetricsStore::new(moka, sink.clone()));
//!
//! // Hand it to the cache - metrics emitted automatically
//! let cache = SwrCacheBuilder::new(origin).store(store).build();
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::entry::Entry;
use crate::error::CacheError;
use crate::store::Store;

/// Metrics emitted by the MetricsStore wrapper.
#[derive(Debug, Clone)]
pub enum CacheMetric {
    /// Emitted on every store read (get) operation.
    Read {
        /// The key that was read.
        key: String,
        /// Whether an entry was returned.
        hit: bool,
        /// Whether the read errored (reported as a miss to the cache).
        failed: bool,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the store tier (from Store::name()).
        tier: String,
    },
    /// Emitted on every store write (put) operation.
    Write {
        /// The key that was written.
        key: String,
        /// TTL requested for the entry.
        ttl: Duration,
        /// Whether the write errored.
        failed: bool,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the store tier (from Store::name()).
        tier: String,
    },
    /// Emitted on every store remove operation.
    Remove {
        /// Number of keys in the remove batch.
        key_count: usize,
        /// First key in the batch (for debugging/identification).
        first_key: Option<String>,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the store tier (from Store::name()).
        tier: String,
    },
}

/// Trait for receiving cache metrics.
///
/// Implement this trait to collect metrics from `MetricsStore`.
///
/// # Example
///
/// ```ignore
/// use std::sync::Mutex;
/// use async_trait::async_trait;
/// use swr_http_cache::{CacheMetric, MetricsSink};
///
/// struct BufferedSink {
///     buffer: Mutex<Vec<CacheMetric>>,
/// }
///
/// #[async_trait]
/// impl MetricsSink for BufferedSink {
///     fn emit(&self, metric: CacheMetric) {
///         self.buffer.lock().unwrap().push(metric);
///     }
///
///     async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///         // Send buffered metrics to your backend
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Emit a single metric.
    ///
    /// This is called synchronously in the hot path of store operations.
    /// Implementations should be fast (e.g., buffer metrics in memory).
    fn emit(&self, metric: CacheMetric);

    /// Flush any buffered metrics.
    ///
    /// Called when the caller wants to ensure all metrics are persisted.
    /// This is typically called at shutdown or at periodic intervals.
    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A store wrapper that emits metrics for all operations.
///
/// `MetricsStore` wraps any `Store` implementation and emits metrics
/// for read, write, and remove operations to a user-provided sink.
pub struct MetricsStore {
    inner: Arc<dyn Store>,
    sink: Arc<dyn MetricsSink>,
    tier_name: String,
}

impl MetricsStore {
    /// Create a new MetricsStore wrapping the given store.
    ///
    /// # Arguments
    /// * `inner` - The store to wrap
    /// * `sink` - The metrics sink to emit metrics to
    pub fn new(inner: Arc<dyn Store>, sink: Arc<dyn MetricsSink>) -> Self {
        let tier_name = inner.name().to_string();
        MetricsStore {
            inner,
            sink,
            tier_name,
        }
    }

    /// Get a reference to the metrics sink.
    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }

    fn elapsed_ms(start: Instant) -> f64 {
        start.elapsed().as_secs_f64() * 1000.0
    }
}

#[async_trait]
impl Store for MetricsStore {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn get(&self, key: &str) -> Result<Option<Entry>, CacheError> {
        let start = Instant::now();
        let result = self.inner.get(key).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(CacheMetric::Read {
            key: key.to_string(),
            hit: matches!(result, Ok(Some(_))),
            failed: result.is_err(),
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn put(&self, key: &str, entry: Entry, ttl: Duration) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.put(key, entry, ttl).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(CacheMetric::Write {
            key: key.to_string(),
            ttl,
            failed: result.is_err(),
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.remove(keys).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(CacheMetric::Remove {
            key_count: keys.len(),
            first_key: keys.first().map(|k| k.to_string()),
            latency_ms,
            tier: self.tier_name.clone(),
        });

        result
    }
}

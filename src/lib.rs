//! swr-http-cache - A stale-while-revalidate (SWR) HTTP response cache
//!
//! The cache sits in front of an origin fetch and:
//! - Fingerprints requests (method, URL, headers, body) with SHA-256
//! - Keeps a long-lived payload entry and a short-lived freshness marker per fingerprint
//! - Answers `hit`, `stale` or `miss` immediately, reported in `x-swr-cache`
//! - Revalidates stale entries through a host-provided background executor
//!
//! Store failures never fail a request; the worst case is a trip to the origin.
//!
//! # Example
//!
//! ```ignore
//! use swr_http_cache::{
//!     MokaStore, MokaStoreConfig, OriginRequest, ReqwestOrigin, SwrCacheBuilder, TaskTracker,
//! };
//! use std::sync::Arc;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = TaskTracker::new();
//!     let cache = SwrCacheBuilder::new(Arc::new(ReqwestOrigin::new()))
//!         .store(Arc::new(MokaStore::new(MokaStoreConfig::default())))
//!         .detach(Arc::new(tracker.clone()))
//!         .build();
//!
//!     let request = OriginRequest::get(Url::parse("https://www.reddit.com/r/rust/top.json")?);
//!     let response = cache.serve(request, 60).await?;
//!     println!("{:?}", response.header("x-swr-cache"));
//!
//!     // Let background revalidations finish before exiting
//!     tracker.wait().await;
//!     Ok(())
//! }
//! ```

mod background;
mod builder;
mod entry;
mod error;
mod fingerprint;
mod freshness;
mod origin;
mod request;
mod store;
pub mod stores;
mod swr;
mod tiered;
mod utils;

// Re-export public API
pub use background::{Detach, TaskTracker};
pub use builder::{DEFAULT_STATUS_HEADER, DEFAULT_STORAGE_TTL, SwrCacheBuilder, SwrCacheConfig};
pub use entry::Entry;
pub use error::CacheError;
pub use fingerprint::{CacheKeys, DEFAULT_KEY_PREFIX, Fingerprint, KeyRole, build_cache_key, fingerprint};
pub use freshness::FreshnessTracker;
pub use origin::{Origin, ReqwestOrigin};
pub use request::{BYPASS_QUERY_PARAM, HttpResponse, OriginRequest, bypass_requested};
pub use store::{CacheStore, Store};
pub use stores::memory::{EvictOnSetConfig, HashMapStore, HashMapStoreConfig};
pub use stores::metrics::{CacheMetric, MetricsSink, MetricsStore};
pub use stores::moka::{MokaStore, MokaStoreConfig};
pub use stores::redis::{RedisStore, RedisStoreConfig};
pub use swr::{CacheStatus, SwrCache};
pub use tiered::TieredStore;

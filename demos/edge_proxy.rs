//! Route-layer glue in front of the cache.
//!
//! Mirrors a page loader that fetches a subreddit listing: inbound URLs with
//! `?no-cache` skip the cache, everything else is served stale-while-revalidate
//! with a 6000 second freshness window.
//!
//! Run with: `RUST_LOG=swr_http_cache=debug cargo run --example edge_proxy -- rust`

use std::sync::Arc;
use std::time::Duration;
use swr_http_cache::{
    MokaStore, MokaStoreConfig, OriginRequest, ReqwestOrigin, SwrCache, SwrCacheBuilder,
    TaskTracker, bypass_requested,
};
use tracing_subscriber::EnvFilter;
use url::Url;

const MAX_AGE_SECS: u64 = 6_000;

async fn load_subreddit(
    cache: &SwrCache,
    inbound: &Url,
    subreddit: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let upstream = Url::parse(&format!(
        "https://www.reddit.com/r/{}/top.json?limit=10&t=year",
        subreddit
    ))?;
    let request = OriginRequest::get(upstream).with_bypass(bypass_requested(inbound));

    let response = cache.fetch(request, MAX_AGE_SECS).await?;
    println!(
        "{} -> status={} cache={} bytes={}",
        inbound,
        response.status,
        response.header("x-swr-cache").unwrap_or("bypass"),
        response.body.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let subreddit = std::env::args().nth(1).unwrap_or_else(|| "rust".to_string());

    let client = reqwest::Client::builder()
        .user_agent("swr-http-cache-demo/0.1")
        .timeout(Duration::from_secs(10))
        .build()?;
    let tracker = TaskTracker::new();
    let cache = SwrCacheBuilder::new(Arc::new(ReqwestOrigin::with_client(client)))
        .store(Arc::new(MokaStore::new(MokaStoreConfig::default())))
        .detach(Arc::new(tracker.clone()))
        .build();

    let page = Url::parse(&format!("https://app.example.com/r/{}", subreddit))?;
    let page_no_cache = Url::parse(&format!("https://app.example.com/r/{}?no-cache", subreddit))?;

    // miss, then hit, then a bypassed fetch
    load_subreddit(&cache, &page, &subreddit).await?;
    load_subreddit(&cache, &page, &subreddit).await?;
    load_subreddit(&cache, &page_no_cache, &subreddit).await?;

    // Do not exit before background revalidations have landed
    tracker.wait().await;
    Ok(())
}

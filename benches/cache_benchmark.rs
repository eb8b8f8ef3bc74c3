use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use http::{HeaderValue, Method, header};
use std::sync::Arc;
use swr_http_cache::{
    CacheError, HashMapStore, HashMapStoreConfig, HttpResponse, MokaStore, MokaStoreConfig,
    Origin, OriginRequest, Store, SwrCache, SwrCacheBuilder, TaskTracker, fingerprint,
};
use tokio::runtime::Runtime;
use url::Url;

/// Origin answering instantly with a fixed body of the requested size.
struct FixedOrigin {
    body: Vec<u8>,
}

#[async_trait]
impl Origin for FixedOrigin {
    async fn fetch(&self, _request: OriginRequest) -> Result<HttpResponse, CacheError> {
        Ok(HttpResponse::new(200, self.body.clone()))
    }
}

fn request(i: usize) -> OriginRequest {
    let url = Url::parse(&format!("https://www.reddit.com/r/sub{}/top.json?limit=10", i)).unwrap();
    OriginRequest::get(url)
        .with_header(header::ACCEPT, HeaderValue::from_static("application/json"))
        .with_header(header::USER_AGENT, HeaderValue::from_static("bench/1.0"))
}

fn setup(store: Arc<dyn Store>, body_size: usize) -> SwrCache {
    SwrCacheBuilder::new(Arc::new(FixedOrigin {
        body: vec![b'x'; body_size],
    }))
    .store(store)
    .detach(Arc::new(TaskTracker::new()))
    .build()
}

/// Benchmark 1: fingerprinting GET and POST requests
fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    let get = request(1);
    group.bench_function("get", |b| b.iter(|| fingerprint(black_box(&get))));

    for size in [1_024, 65_536] {
        let post = OriginRequest::new(Method::POST, Url::parse("https://api.example.com/q").unwrap())
            .with_body(vec![b'q'; size]);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("post", size), &post, |b, post| {
            b.iter(|| fingerprint(black_box(post)))
        });
    }

    group.finish();
}

/// Benchmark 2: hot cache (all hits, pure read path)
fn bench_hot_cache(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hot_cache");
    let keys = 1_000;

    let stores: Vec<(&str, Arc<dyn Store>)> = vec![
        (
            "hashmap",
            Arc::new(HashMapStore::new(HashMapStoreConfig::default())),
        ),
        ("moka", Arc::new(MokaStore::new(MokaStoreConfig::default()))),
    ];

    for (name, store) in stores {
        let cache = setup(store, 4_096);

        // Pre-populate cache
        rt.block_on(async {
            for i in 0..keys {
                cache.serve(request(i), 3_600).await.unwrap();
            }
        });

        group.throughput(Throughput::Elements(keys as u64));
        group.bench_function(BenchmarkId::new("serve_hit", name), |b| {
            b.to_async(&rt).iter(|| async {
                for i in 0..keys {
                    black_box(cache.serve(request(i), 3_600).await.unwrap());
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_hot_cache);
criterion_main!(benches);

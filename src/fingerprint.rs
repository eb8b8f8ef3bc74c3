//! Request fingerprinting and cache key derivation.

use http::Method;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::request::OriginRequest;

/// Default private prefix for cache keys.
pub const DEFAULT_KEY_PREFIX: &str = "/__swr";

/// Hex-encoded SHA-256 digest identifying a class of cache-equivalent requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of a request.
///
/// Covers the lowercased method, the URL, every header name/value pair in
/// request order and, for methods other than GET and HEAD, the body. Each
/// component is terminated by a NUL byte so neighbouring components cannot
/// trade bytes and collide.
pub fn fingerprint(request: &OriginRequest) -> Fingerprint {
    let mut hasher = Sha256::new();

    hasher.update(request.method().as_str().to_ascii_lowercase().as_bytes());
    hasher.update(b"\0");
    hasher.update(request.url().as_str().as_bytes());
    hasher.update(b"\0");

    for (name, value) in request.headers() {
        hasher.update(name.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(value.as_bytes());
        hasher.update(b"\0");
    }

    let method = request.method();
    if *method != Method::GET
        && *method != Method::HEAD
        && let Some(body) = request.body()
    {
        hasher.update(body);
    }

    Fingerprint(hex::encode(hasher.finalize()))
}

/// Which of the two entries of a fingerprint a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// The cached response.
    Payload,
    /// The freshness marker.
    Freshness,
}

impl KeyRole {
    fn tag(self) -> &'static str {
        match self {
            KeyRole::Payload => "request",
            KeyRole::Freshness => "stillgood",
        }
    }
}

/// Build the store key for one role of a fingerprint.
///
/// Format: `{prefix}/swr:{role}:{fingerprint}`
pub fn build_cache_key(prefix: &str, fingerprint: &Fingerprint, role: KeyRole) -> String {
    format!(
        "{}/swr:{}:{}",
        prefix.trim_end_matches('/'),
        role.tag(),
        fingerprint
    )
}

/// The payload and freshness keys of one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    pub payload: String,
    pub freshness: String,
}

impl CacheKeys {
    pub fn new(prefix: &str, fingerprint: &Fingerprint) -> Self {
        CacheKeys {
            payload: build_cache_key(prefix, fingerprint, KeyRole::Payload),
            freshness: build_cache_key(prefix, fingerprint, KeyRole::Freshness),
        }
    }
}

//! Request and response shapes exchanged with the origin.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameter that asks the glue code to skip the cache entirely.
pub const BYPASS_QUERY_PARAM: &str = "no-cache";

/// A request aimed at the origin.
///
/// The body is held as `Bytes`, so cloning the request for fingerprinting or
/// for a background re-fetch never consumes the body needed by the origin.
#[derive(Debug, Clone)]
pub struct OriginRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    bypass: bool,
}

impl OriginRequest {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        OriginRequest {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            bypass: false,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Append a header. Repeated names keep every value in insertion order.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Flag the request so that [`crate::SwrCache::fetch`] goes straight to the origin.
    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn bypass(&self) -> bool {
        self.bypass
    }
}

/// Returns true when the inbound URL carries the `no-cache` query parameter.
pub fn bypass_requested(url: &Url) -> bool {
    url.query_pairs().any(|(name, _)| name == BYPASS_QUERY_PARAM)
}

/// A response as returned by the origin and as stored in the cache.
///
/// Header names are kept lowercase; lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A bodiless `200 OK`, used for freshness markers.
    pub fn empty() -> Self {
        Self::new(StatusCode::OK.as_u16(), Bytes::new())
    }

    /// Only `200 OK` responses are ever written to the cache.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `name` with a single `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_ascii_lowercase(), value.into()));
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }
}

use async_trait::async_trait;

use crate::error::CacheError;
use crate::request::{HttpResponse, OriginRequest};

/// The upstream fetch the cache sits in front of.
///
/// Implementations own their timeouts; the cache never wraps a fetch in one.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Perform the request. Any status code is a successful fetch; only
    /// transport failures are errors.
    async fn fetch(&self, request: OriginRequest) -> Result<HttpResponse, CacheError>;
}

/// [`Origin`] backed by a `reqwest` client.
#[derive(Clone, Default)]
pub struct ReqwestOrigin {
    client: reqwest::Client,
}

impl ReqwestOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, TLS settings).
    pub fn with_client(client: reqwest::Client) -> Self {
        ReqwestOrigin { client }
    }
}

#[async_trait]
impl Origin for ReqwestOrigin {
    async fn fetch(&self, request: OriginRequest) -> Result<HttpResponse, CacheError> {
        let url = request.url().clone();

        let mut builder = self
            .client
            .request(request.method().clone(), url.clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CacheError::origin(url.as_str(), e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                // Non-ASCII values are legal on the wire but rejected by `to_str`
                let value = match value.to_str() {
                    Ok(v) => v.to_string(),
                    Err(_) => {
                        let lossy = String::from_utf8_lossy(value.as_bytes());
                        if matches!(lossy, std::borrow::Cow::Owned(_)) {
                            tracing::debug!(
                                url = %url,
                                header = %name,
                                "header value is not UTF-8, replacing invalid bytes"
                            );
                        }
                        lossy.into_owned()
                    }
                };
                (name.as_str().to_string(), value)
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::origin(url.as_str(), e.to_string()))?;

        tracing::debug!(url = %url, status, "origin fetch complete");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

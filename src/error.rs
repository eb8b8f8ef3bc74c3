/// Error type for cache operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// A store operation failed.
    #[error("[{tier}] cache error for key '{key}': {message}")]
    Operation {
        tier: String,
        key: String,
        message: String,
    },
    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The origin fetch failed before producing a response.
    #[error("origin fetch failed for '{url}': {message}")]
    Origin { url: String, message: String },
    /// The freshness window must be at least one second.
    #[error("max age must be a positive number of seconds, got {0}")]
    InvalidMaxAge(u64),
}

impl CacheError {
    /// Create a new operation error.
    pub fn operation(
        tier: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Operation {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new origin error.
    pub fn origin(url: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Origin {
            url: url.into(),
            message: message.into(),
        }
    }
}

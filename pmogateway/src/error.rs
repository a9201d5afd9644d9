//! Error types for the metadata gateway adapters

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while talking to (or decoding) an upstream provider
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured base URL cannot carry path segments (e.g. `mailto:`)
    #[error("Base URL cannot be used for API calls: {0}")]
    InvalidBaseUrl(String),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// An empty identifier was given where a video id is required
    #[error("Missing item identifier")]
    MissingIdentifier,

    /// Unknown provider name in configuration
    #[error("Unknown upstream provider: {0}")]
    UnknownProvider(String),

    /// Header value rejected by the HTTP stack
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// Configuration error (from pmoconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl GatewayError {
    /// Create an invalid base URL error
    pub fn invalid_base_url(url: impl Into<String>) -> Self {
        Self::InvalidBaseUrl(url.into())
    }
}

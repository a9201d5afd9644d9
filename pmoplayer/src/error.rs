//! Error types for the player

use pmogateway::GatewayError;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Errors raised while talking to the proxy or driving the controller
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The proxy answered with a non-success status
    #[error("Proxy error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Upstream payload could not be decoded
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Invalid proxy URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The controller task is gone
    #[error("Playback controller stopped")]
    ControllerStopped,
}

impl PlayerError {
    /// Build a status error from a proxy answer body
    ///
    /// The proxy reports its own failures as `{"error": "..."}`; relayed
    /// upstream errors are kept as raw text.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|json| json.get("error")?.as_str().map(str::to_string))
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

        PlayerError::Status { status, message }
    }
}

/// Why a track could not be turned into a playable URL
///
/// Never shown to the user one by one: the controller skips to the next
/// track instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("stream manifest unavailable for {id}: {reason}")]
    ManifestUnavailable { id: String, reason: String },

    #[error("no acceptable audio variant for {id}")]
    NoAcceptableVariant { id: String },

    #[error("media output rejected {id}: {reason}")]
    OutputRejected { id: String, reason: String },
}

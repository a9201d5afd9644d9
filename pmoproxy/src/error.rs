//! Erreurs du proxy et leur traduction en réponses HTTP

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use pmogateway::GatewayError;

/// Message renvoyé au client pour une requête mal formée
pub const INVALID_REQUEST_MESSAGE: &str =
    "Invalid request. Provide \"endpoint\" and relevant parameters (q or videoId).";

/// Message générique renvoyé au client pour toute faute locale
pub const INTERNAL_ERROR_MESSAGE: &str = "Proxy failed to fetch from API.";

/// Message renvoyé quand l'amont ne répond pas du JSON
pub const BAD_FORMAT_MESSAGE: &str = "Upstream API returned an unexpected response format.";

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors produced while translating and forwarding a proxy call
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Missing or unknown `endpoint`, or blank `q` / `videoId` (400)
    #[error("{}", INVALID_REQUEST_MESSAGE)]
    InvalidRequest,

    /// Upstream answered with a non-success status, relayed as is
    #[error("Upstream API error ({status})")]
    Upstream {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },

    /// Upstream answered 2xx with something that is not JSON (502)
    #[error("Upstream returned a non-JSON response (content-type: {content_type})")]
    BadUpstreamFormat { content_type: String },

    /// Network or transport fault while talking to upstream (500)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream URL could not be built (500)
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl ProxyError {
    /// HTTP status sent back to the caller
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::BadUpstreamFormat { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Http(_) | ProxyError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Vérifie si l'erreur est une faute locale du proxy
    pub fn is_internal(&self) -> bool {
        matches!(self, ProxyError::Http(_) | ProxyError::Gateway(_))
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ProxyError::Upstream {
                content_type, body, ..
            } => {
                // Relai verbatim : statut, corps et type de contenu amont
                let mut response = (status, body).into_response();
                if let Some(content_type) = content_type {
                    response.headers_mut().insert(CONTENT_TYPE, content_type);
                }
                return response;
            }
            ProxyError::InvalidRequest => INVALID_REQUEST_MESSAGE,
            ProxyError::BadUpstreamFormat { .. } => BAD_FORMAT_MESSAGE,
            // Le détail est journalisé côté serveur, jamais renvoyé
            ProxyError::Http(_) | ProxyError::Gateway(_) => INTERNAL_ERROR_MESSAGE,
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

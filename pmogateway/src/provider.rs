//! Upstream provider abstraction
//!
//! PMOTube can talk to two families of public metadata APIs. Their URL
//! layouts, required headers and JSON field names differ; everything
//! provider-specific lives behind [`UpstreamProvider`] so that the proxy and
//! the player never branch on the provider themselves.

use crate::error::{GatewayError, Result};
use crate::invidious::InvidiousProvider;
use crate::models::{AudioVariant, QueueItem};
use crate::piped::PipedProvider;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Supported upstream API families
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Piped,
    Invidious,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Piped => "piped",
            ProviderKind::Invidious => "invidious",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "piped" => Ok(ProviderKind::Piped),
            "invidious" => Ok(ProviderKind::Invidious),
            other => Err(GatewayError::UnknownProvider(other.to_string())),
        }
    }
}

/// Contract shared by every upstream adapter
///
/// The proxy uses the URL and header builders, the player uses the parsers.
/// Both sides must be configured with the same provider kind.
pub trait UpstreamProvider: fmt::Debug + Send + Sync {
    /// Which API family this adapter speaks
    fn kind(&self) -> ProviderKind;

    /// Base URL of the upstream instance
    fn base_url(&self) -> &Url;

    /// Upstream URL of a search restricted to music content
    fn search_url(&self, query: &str) -> Result<Url>;

    /// Upstream URL of the stream manifest for one item
    fn stream_url(&self, id: &str) -> Result<Url>;

    /// Extra headers the upstream expects on every request
    fn request_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Decode a search response body, preserving upstream order
    fn parse_search(&self, body: &[u8]) -> Result<Vec<QueueItem>>;

    /// Decode a stream manifest body into its audio variants
    fn parse_manifest(&self, body: &[u8]) -> Result<Vec<AudioVariant>>;
}

/// Everything needed to build a provider adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    /// `Origin` header value sent to Piped instances
    pub origin: Option<String>,
}

impl ProviderSettings {
    pub fn new(kind: ProviderKind, base_url: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: base_url.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Build the adapter matching `settings.kind`
pub fn build_provider(settings: &ProviderSettings) -> Result<Arc<dyn UpstreamProvider>> {
    let provider: Arc<dyn UpstreamProvider> = match settings.kind {
        ProviderKind::Piped => {
            let mut piped = PipedProvider::new(&settings.base_url)?;
            if let Some(origin) = &settings.origin {
                piped = piped.with_origin(origin)?;
            }
            Arc::new(piped)
        }
        ProviderKind::Invidious => Arc::new(InvidiousProvider::new(&settings.base_url)?),
    };

    tracing::debug!(
        provider = %settings.kind,
        base_url = %settings.base_url,
        "Upstream provider ready"
    );

    Ok(provider)
}

/// Parse and check a base URL so that path segments can be appended to it
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url.trim())?;
    if url.cannot_be_a_base() {
        return Err(GatewayError::invalid_base_url(base_url));
    }
    Ok(url)
}

/// Append percent-encoded path segments to `base`, keeping any base path
///
/// `https://host/api` + `["streams", "a/b"]` → `https://host/api/streams/a%2Fb`
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| GatewayError::invalid_base_url(base.as_str()))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Reject blank identifiers before they reach an URL
pub(crate) fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        Err(GatewayError::MissingIdentifier)
    } else {
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("piped".parse::<ProviderKind>().unwrap(), ProviderKind::Piped);
        assert_eq!(
            " Invidious ".parse::<ProviderKind>().unwrap(),
            ProviderKind::Invidious
        );
        assert!(matches!(
            "youtube".parse::<ProviderKind>(),
            Err(GatewayError::UnknownProvider(name)) if name == "youtube"
        ));
    }

    #[test]
    fn test_endpoint_url_keeps_base_path_and_encodes() {
        let base = Url::parse("https://example.org/api/").unwrap();
        let url = endpoint_url(&base, &["streams", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/streams/a%2Fb%20c");
    }

    #[test]
    fn test_parse_base_url_rejects_non_base() {
        assert!(parse_base_url("mailto:someone@example.org").is_err());
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("https://pipedapi.example.org").is_ok());
    }

    #[test]
    fn test_build_provider_matches_kind() {
        let piped = build_provider(
            &ProviderSettings::new(ProviderKind::Piped, "https://pipedapi.example.org")
                .with_origin("https://piped.video"),
        )
        .unwrap();
        assert_eq!(piped.kind(), ProviderKind::Piped);
        assert!(piped.request_headers().contains_key("origin"));

        let invidious = build_provider(&ProviderSettings::new(
            ProviderKind::Invidious,
            "https://yewtu.be",
        ))
        .unwrap();
        assert_eq!(invidious.kind(), ProviderKind::Invidious);
        assert!(invidious.request_headers().is_empty());
    }
}

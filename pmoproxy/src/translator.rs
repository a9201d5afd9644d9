//! Traduction d'une requête proxy en un appel amont
//!
//! Le traducteur est sans état : il ne détient que le client HTTP partagé et
//! l'adaptateur du fournisseur configuré. Chaque requête produit exactement
//! un appel amont.

use crate::error::{ProxyError, Result};
use crate::request::ProxyRequest;
use bytes::Bytes;
use pmogateway::UpstreamProvider;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Default timeout for upstream requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User-Agent announced to upstream instances
pub const DEFAULT_USER_AGENT: &str = concat!("PMOTube/", env!("CARGO_PKG_VERSION"), " (pmoproxy)");

/// Réponse JSON amont validée, prête à être relayée
#[derive(Debug, Clone)]
pub struct UpstreamJson {
    pub content_type: HeaderValue,
    pub body: Bytes,
}

/// Proxy translator
#[derive(Debug, Clone)]
pub struct ProxyTranslator {
    client: reqwest::Client,
    provider: Arc<dyn UpstreamProvider>,
}

impl ProxyTranslator {
    /// Create a translator with default settings
    pub fn new(provider: Arc<dyn UpstreamProvider>) -> Result<Self> {
        Self::builder(provider).build()
    }

    pub fn builder(provider: Arc<dyn UpstreamProvider>) -> ProxyTranslatorBuilder {
        ProxyTranslatorBuilder::new(provider)
    }

    /// Build a translator from the `upstream` configuration section
    #[cfg(feature = "pmoconfig")]
    pub fn from_config() -> anyhow::Result<Self> {
        use pmogateway::{GatewayConfigExt, build_provider};

        let config = pmoconfig::get_config();
        let provider = build_provider(&config.get_provider_settings()?)?;
        let timeout = config.get_upstream_request_timeout_secs()?;

        Ok(Self::builder(provider)
            .timeout(Duration::from_secs(timeout))
            .build()?)
    }

    pub fn provider(&self) -> &Arc<dyn UpstreamProvider> {
        &self.provider
    }

    /// Upstream URL targeted by a validated request
    pub fn target_url(&self, request: &ProxyRequest) -> Result<Url> {
        let url = match request {
            ProxyRequest::Search { query } => self.provider.search_url(query)?,
            ProxyRequest::Stream { id } => self.provider.stream_url(id)?,
        };
        Ok(url)
    }

    /// Forward one request upstream and validate the answer
    ///
    /// - non-2xx: [`ProxyError::Upstream`] with status, body and content type
    /// - 2xx that is not JSON: [`ProxyError::BadUpstreamFormat`]
    /// - transport fault: [`ProxyError::Http`]
    pub async fn forward(&self, request: &ProxyRequest) -> Result<UpstreamJson> {
        let url = self.target_url(request)?;
        debug!(
            endpoint = request.endpoint(),
            provider = %self.provider.kind(),
            url = %url,
            "Forwarding proxy request"
        );

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .headers(self.provider.request_headers())
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, "Proxy internal error: {}", e);
                ProxyError::Http(e)
            })?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(|e| {
            error!(url = %url, "Failed to read upstream body: {}", e);
            ProxyError::Http(e)
        })?;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                url = %url,
                "Upstream API error: {}",
                String::from_utf8_lossy(&body)
            );
            return Err(ProxyError::Upstream {
                status,
                content_type,
                body,
            });
        }

        let content_type = match content_type {
            Some(ct) if is_json_content_type(&ct) => ct,
            other => {
                let content_type = other
                    .as_ref()
                    .and_then(|ct| ct.to_str().ok())
                    .unwrap_or("<none>")
                    .to_string();
                warn!(url = %url, content_type = %content_type, "Upstream returned non-JSON content");
                return Err(ProxyError::BadUpstreamFormat { content_type });
            }
        };

        // Un corps annoncé JSON mais illisible est traité comme un format invalide
        if let Err(e) = serde_json::from_slice::<serde::de::IgnoredAny>(&body) {
            warn!(url = %url, "Upstream JSON body does not parse: {}", e);
            return Err(ProxyError::BadUpstreamFormat {
                content_type: content_type.to_str().unwrap_or_default().to_string(),
            });
        }

        Ok(UpstreamJson { content_type, body })
    }
}

/// `application/json` ou tout type `+json` (`application/problem+json`…)
pub fn is_json_content_type(value: &HeaderValue) -> bool {
    let Ok(value) = value.to_str() else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Builder for [`ProxyTranslator`]
pub struct ProxyTranslatorBuilder {
    provider: Arc<dyn UpstreamProvider>,
    timeout: Duration,
    user_agent: String,
}

impl ProxyTranslatorBuilder {
    pub fn new(provider: Arc<dyn UpstreamProvider>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set custom user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ProxyTranslator> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(ProxyTranslator {
            client,
            provider: self.provider,
        })
    }
}

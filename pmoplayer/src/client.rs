//! Accès aux métadonnées via le proxy PMOTube
//!
//! [`ProxyClient`] parle HTTP au proxy (`{proxy_url}/api/proxy`) et renvoie
//! les corps JSON bruts. [`ProxyGateway`] y ajoute les parseurs du
//! fournisseur configuré et implémente [`MetadataSource`], la seule interface
//! que voient la recherche et le résolveur.

use crate::error::{PlayerError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use pmogateway::{AudioVariant, QueueItem, UpstreamProvider};
use reqwest::header::ACCEPT;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default timeout for proxy requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User-Agent announced to the proxy
pub const DEFAULT_USER_AGENT: &str = concat!("PMOTube/", env!("CARGO_PKG_VERSION"), " (pmoplayer)");

/// Source of search results and stream manifests
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Raw search results, in upstream order, playable or not
    async fn search(&self, query: &str) -> Result<Vec<QueueItem>>;

    /// Audio variants of one item
    async fn stream_manifest(&self, id: &str) -> Result<Vec<AudioVariant>>;
}

/// HTTP client for the proxy endpoint
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ProxyClient {
    /// Create a client for the proxy served at `proxy_url`
    pub fn new(proxy_url: &str) -> Result<Self> {
        Self::with_timeout(proxy_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(proxy_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: proxy_endpoint(proxy_url)?,
        })
    }

    /// Full URL of the proxy route
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `GET /api/proxy?endpoint=search&q=…`
    pub async fn search_raw(&self, query: &str) -> Result<Bytes> {
        self.get(&[("endpoint", "search"), ("q", query)]).await
    }

    /// `GET /api/proxy?endpoint=stream&videoId=…`
    pub async fn stream_raw(&self, id: &str) -> Result<Bytes> {
        self.get(&[("endpoint", "stream"), ("videoId", id)]).await
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<Bytes> {
        debug!(endpoint = %self.endpoint, ?params, "Calling proxy");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(params)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Proxy error: {}", String::from_utf8_lossy(&body));
            return Err(PlayerError::from_status(status.as_u16(), &body));
        }

        Ok(body)
    }
}

/// `http://host:port/prefix` → `http://host:port/prefix/api/proxy`
fn proxy_endpoint(proxy_url: &str) -> Result<Url> {
    let mut url = Url::parse(proxy_url.trim())?;
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["api", "proxy"]);
    Ok(url)
}

/// [`MetadataSource`] backed by the proxy and the provider's parsers
#[derive(Debug, Clone)]
pub struct ProxyGateway {
    client: ProxyClient,
    provider: Arc<dyn UpstreamProvider>,
}

impl ProxyGateway {
    /// The provider must match the one the proxy is configured with
    pub fn new(client: ProxyClient, provider: Arc<dyn UpstreamProvider>) -> Self {
        Self { client, provider }
    }

    /// Build from the `player` and `upstream` configuration sections
    #[cfg(feature = "pmoconfig")]
    pub fn from_config() -> anyhow::Result<Self> {
        use crate::config_ext::PlayerConfigExt;
        use pmogateway::{GatewayConfigExt, build_provider};

        let config = pmoconfig::get_config();
        let provider = build_provider(&config.get_provider_settings()?)?;
        let timeout = config.get_upstream_request_timeout_secs()?;
        let client =
            ProxyClient::with_timeout(&config.get_player_proxy_url()?, Duration::from_secs(timeout))?;

        Ok(Self::new(client, provider))
    }

    pub fn client(&self) -> &ProxyClient {
        &self.client
    }
}

#[async_trait]
impl MetadataSource for ProxyGateway {
    async fn search(&self, query: &str) -> Result<Vec<QueueItem>> {
        let body = self.client.search_raw(query).await?;
        Ok(self.provider.parse_search(&body)?)
    }

    async fn stream_manifest(&self, id: &str) -> Result<Vec<AudioVariant>> {
        let body = self.client.stream_raw(id).await?;
        Ok(self.provider.parse_manifest(&body)?)
    }
}

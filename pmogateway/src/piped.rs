//! Piped API adapter
//!
//! Piped instances reject requests that do not look like they come from a
//! known frontend, so every call carries a spoofed `Origin` header.
//!
//! - Search: `GET {base}/search?q=<query>&filter=music`, results in `items`
//! - Manifest: `GET {base}/streams/{videoId}`, variants in `audioStreams`

use crate::error::{GatewayError, Result};
use crate::models::{AudioVariant, ItemKind, QueueItem, deserialize_bitrate};
use crate::provider::{ProviderKind, UpstreamProvider, endpoint_url, parse_base_url, require_id};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN};
use serde::Deserialize;
use url::Url;

/// Default Piped API instance
pub const DEFAULT_PIPED_BASE_URL: &str = "https://pipedapi.in.projectsegfau.lt";

/// Origin announced to Piped instances
pub const DEFAULT_PIPED_ORIGIN: &str = "https://piped.video";

/// Server-side search filter restricting results to music
pub const PIPED_SEARCH_FILTER: &str = "music";

/// `type` marker of playable entries in search results
const PIPED_STREAM_TYPE: &str = "stream";

#[derive(Debug, Deserialize)]
struct PipedSearchResponse {
    #[serde(default)]
    items: Vec<PipedSearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedSearchItem {
    #[serde(rename = "type", default)]
    item_type: String,
    #[serde(default)]
    title: Option<String>,
    /// Channels and playlists carry a `name` instead of a `title`
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    uploader_name: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    /// Relative watch URL, e.g. `/watch?v=dQw4w9WgXcQ`
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedStreams {
    #[serde(default)]
    audio_streams: Vec<PipedAudioStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedAudioStream {
    #[serde(default)]
    mime_type: String,
    #[serde(default, deserialize_with = "deserialize_bitrate")]
    bitrate: u64,
    #[serde(default)]
    url: String,
}

/// Adapter for the Piped API
#[derive(Debug, Clone)]
pub struct PipedProvider {
    base_url: Url,
    origin: HeaderValue,
}

impl PipedProvider {
    /// Create an adapter for the instance at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            origin: HeaderValue::from_static(DEFAULT_PIPED_ORIGIN),
        })
    }

    /// Override the spoofed `Origin` header
    pub fn with_origin(mut self, origin: &str) -> Result<Self> {
        self.origin = HeaderValue::from_str(origin.trim())
            .map_err(|e| GatewayError::InvalidHeader(format!("{}: {}", origin, e)))?;
        Ok(self)
    }

    /// Extract the video identifier from a Piped watch URL
    ///
    /// ```
    /// use pmogateway::PipedProvider;
    ///
    /// assert_eq!(
    ///     PipedProvider::video_id_from_url("/watch?v=dQw4w9WgXcQ"),
    ///     Some("dQw4w9WgXcQ".to_string())
    /// );
    /// assert_eq!(PipedProvider::video_id_from_url("/channel/UC123"), None);
    /// ```
    pub fn video_id_from_url(watch_url: &str) -> Option<String> {
        let anchor = Url::parse("http://localhost/").ok()?;
        let url = anchor.join(watch_url.trim()).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.trim().to_string())
            .filter(|id| !id.is_empty())
    }

    fn convert_item(item: PipedSearchItem) -> QueueItem {
        let id = item
            .url
            .as_deref()
            .and_then(Self::video_id_from_url)
            .unwrap_or_default();

        let kind = if item.item_type == PIPED_STREAM_TYPE && !id.is_empty() {
            ItemKind::Playable
        } else {
            if item.item_type == PIPED_STREAM_TYPE {
                tracing::debug!(url = ?item.url, "Piped stream without a usable video id");
            }
            ItemKind::Other
        };

        QueueItem {
            id,
            title: item.title.or(item.name).unwrap_or_default(),
            artist_name: item.uploader_name.unwrap_or_default(),
            thumbnail_url: item.thumbnail.unwrap_or_default(),
            kind,
        }
    }
}

impl UpstreamProvider for PipedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Piped
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = endpoint_url(&self.base_url, &["search"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("filter", PIPED_SEARCH_FILTER);
        Ok(url)
    }

    fn stream_url(&self, id: &str) -> Result<Url> {
        endpoint_url(&self.base_url, &["streams", require_id(id)?])
    }

    fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, self.origin.clone());
        headers
    }

    fn parse_search(&self, body: &[u8]) -> Result<Vec<QueueItem>> {
        let response: PipedSearchResponse = serde_json::from_slice(body)?;
        Ok(response.items.into_iter().map(Self::convert_item).collect())
    }

    fn parse_manifest(&self, body: &[u8]) -> Result<Vec<AudioVariant>> {
        let streams: PipedStreams = serde_json::from_slice(body)?;
        Ok(streams
            .audio_streams
            .into_iter()
            .filter(|s| !s.url.is_empty())
            .map(|s| AudioVariant::new(s.mime_type, s.bitrate, s.url))
            .collect())
    }
}

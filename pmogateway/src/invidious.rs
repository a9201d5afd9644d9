//! Invidious API adapter
//!
//! - Search: `GET {base}/api/v1/search?q=<query>&type=video`, top-level array
//! - Manifest: `GET {base}/api/v1/videos/{videoId}`, variants in `adaptiveFormats`
//!
//! `adaptiveFormats` mixes audio-only and video-only renditions; only the
//! `audio/*` ones are exposed as variants.

use crate::error::Result;
use crate::models::{AudioVariant, ItemKind, QueueItem, deserialize_bitrate};
use crate::provider::{ProviderKind, UpstreamProvider, endpoint_url, parse_base_url, require_id};
use serde::Deserialize;
use url::Url;

/// Default Invidious instance
pub const DEFAULT_INVIDIOUS_BASE_URL: &str = "https://yewtu.be";

/// Server-side search filter (Invidious has no music filter)
pub const INVIDIOUS_SEARCH_TYPE: &str = "video";

/// Preferred thumbnail quality, first one is used otherwise
const PREFERRED_THUMBNAIL_QUALITY: &str = "medium";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousSearchItem {
    #[serde(rename = "type", default)]
    item_type: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    video_thumbnails: Vec<InvidiousThumbnail>,
}

#[derive(Debug, Deserialize)]
struct InvidiousThumbnail {
    #[serde(default)]
    quality: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvidiousVideo {
    #[serde(default)]
    adaptive_formats: Vec<InvidiousFormat>,
}

#[derive(Debug, Deserialize)]
struct InvidiousFormat {
    #[serde(rename = "type", default)]
    mime_type: String,
    #[serde(default, deserialize_with = "deserialize_bitrate")]
    bitrate: u64,
    #[serde(default)]
    url: String,
}

/// Adapter for the Invidious API
#[derive(Debug, Clone)]
pub struct InvidiousProvider {
    base_url: Url,
}

impl InvidiousProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Instances often return thumbnails relative to themselves
    fn absolute_thumbnail(&self, thumbnails: &[InvidiousThumbnail]) -> String {
        let chosen = thumbnails
            .iter()
            .find(|t| t.quality == PREFERRED_THUMBNAIL_QUALITY)
            .or_else(|| thumbnails.first());

        match chosen {
            Some(t) => self
                .base_url
                .join(&t.url)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| t.url.clone()),
            None => String::new(),
        }
    }

    fn convert_item(&self, item: InvidiousSearchItem) -> QueueItem {
        let id = item.video_id.unwrap_or_default().trim().to_string();
        let kind = if item.item_type == "video" && !id.is_empty() {
            ItemKind::Playable
        } else {
            ItemKind::Other
        };

        QueueItem {
            thumbnail_url: self.absolute_thumbnail(&item.video_thumbnails),
            id,
            title: item.title.unwrap_or_default(),
            artist_name: item.author.unwrap_or_default(),
            kind,
        }
    }
}

impl UpstreamProvider for InvidiousProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Invidious
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = endpoint_url(&self.base_url, &["api", "v1", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("type", INVIDIOUS_SEARCH_TYPE);
        Ok(url)
    }

    fn stream_url(&self, id: &str) -> Result<Url> {
        endpoint_url(&self.base_url, &["api", "v1", "videos", require_id(id)?])
    }

    fn parse_search(&self, body: &[u8]) -> Result<Vec<QueueItem>> {
        let items: Vec<InvidiousSearchItem> = serde_json::from_slice(body)?;
        Ok(items
            .into_iter()
            .map(|item| self.convert_item(item))
            .collect())
    }

    fn parse_manifest(&self, body: &[u8]) -> Result<Vec<AudioVariant>> {
        let video: InvidiousVideo = serde_json::from_slice(body)?;
        Ok(video
            .adaptive_formats
            .into_iter()
            .map(|f| AudioVariant::new(f.mime_type, f.bitrate, f.url))
            .filter(|v| v.is_audio() && !v.url.is_empty())
            .collect())
    }
}

//! Provider-neutral data models
//!
//! Upstream providers each have their own JSON shapes; adapters convert them
//! into the structures below so that the rest of PMOTube never sees a
//! provider-specific field name.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Search results
// ============================================================================

/// Classification of a search result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A single playable media stream
    Playable,
    /// Channels, playlists and anything else that cannot be played directly
    Other,
}

/// One entry of a search response
///
/// Built once from the upstream payload and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueItem {
    /// Opaque upstream video identifier
    pub id: String,
    pub title: String,
    pub artist_name: String,
    pub thumbnail_url: String,
    pub kind: ItemKind,
}

impl QueueItem {
    /// Create a playable item
    pub fn playable(
        id: impl Into<String>,
        title: impl Into<String>,
        artist_name: impl Into<String>,
        thumbnail_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist_name: artist_name.into(),
            thumbnail_url: thumbnail_url.into(),
            kind: ItemKind::Playable,
        }
    }

    /// Check if this item may enter a playback queue
    pub fn is_playable(&self) -> bool {
        self.kind == ItemKind::Playable
    }
}

// ============================================================================
// Stream manifests
// ============================================================================

/// One encoded audio rendition of a track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioVariant {
    /// Full MIME type, possibly with codec parameters
    /// (e.g. `audio/mp4; codecs="mp4a.40.2"`)
    pub mime_type: String,
    pub bitrate_bps: u64,
    pub url: String,
}

impl AudioVariant {
    pub fn new(mime_type: impl Into<String>, bitrate_bps: u64, url: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bitrate_bps,
            url: url.into(),
        }
    }

    /// Container family of the variant, lower-cased
    ///
    /// # Examples
    ///
    /// ```
    /// use pmogateway::AudioVariant;
    ///
    /// let v = AudioVariant::new("audio/mp4; codecs=\"mp4a.40.2\"", 128_000, "https://x");
    /// assert_eq!(v.container(), "mp4");
    /// ```
    pub fn container(&self) -> String {
        let essence = self.mime_type.split(';').next().unwrap_or_default().trim();
        let subtype = essence.split_once('/').map_or(essence, |(_, sub)| sub);
        subtype.trim().to_ascii_lowercase()
    }

    /// Check if the MIME type designates audio content
    pub fn is_audio(&self) -> bool {
        self.mime_type
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("audio/")
    }
}

/// Accepts bitrates encoded either as JSON numbers or as decimal strings
///
/// Invidious reports `"bitrate": "130765"` while Piped uses plain integers.
/// Unparseable values fall back to 0 so that the variant sorts last instead
/// of failing the whole manifest.
pub(crate) fn deserialize_bitrate<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawBitrate {
        Int(u64),
        Float(f64),
        Text(String),
        Null(()),
    }

    Ok(match RawBitrate::deserialize(deserializer)? {
        RawBitrate::Int(n) => n,
        RawBitrate::Float(f) if f.is_finite() && f > 0.0 => f as u64,
        RawBitrate::Float(_) => 0,
        RawBitrate::Text(s) => s.trim().parse().unwrap_or(0),
        RawBitrate::Null(()) => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Bitrated {
        #[serde(deserialize_with = "deserialize_bitrate")]
        bitrate: u64,
    }

    fn bitrate_of(json: &str) -> u64 {
        serde_json::from_str::<Bitrated>(json).unwrap().bitrate
    }

    #[test]
    fn test_bitrate_accepts_numbers_and_strings() {
        assert_eq!(bitrate_of(r#"{"bitrate": 128000}"#), 128_000);
        assert_eq!(bitrate_of(r#"{"bitrate": "130765"}"#), 130_765);
        assert_eq!(bitrate_of(r#"{"bitrate": 64000.0}"#), 64_000);
        assert_eq!(bitrate_of(r#"{"bitrate": "n/a"}"#), 0);
        assert_eq!(bitrate_of(r#"{"bitrate": null}"#), 0);
    }

    #[test]
    fn test_container() {
        assert_eq!(AudioVariant::new("audio/webm; codecs=\"opus\"", 1, "u").container(), "webm");
        assert_eq!(AudioVariant::new("AUDIO/MP4", 1, "u").container(), "mp4");
        assert_eq!(AudioVariant::new("mp4", 1, "u").container(), "mp4");
        assert_eq!(AudioVariant::new("", 1, "u").container(), "");
    }

    #[test]
    fn test_is_audio() {
        assert!(AudioVariant::new("audio/mp4", 1, "u").is_audio());
        assert!(!AudioVariant::new("video/mp4; codecs=\"avc1\"", 1, "u").is_audio());
    }
}

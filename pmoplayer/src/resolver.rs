//! Stream resolution: item → best acceptable audio variant

use crate::client::MetadataSource;
use crate::error::ResolutionFailure;
use pmogateway::{AudioVariant, QueueItem};
use std::sync::Arc;
use tracing::{debug, warn};

/// Containers accepted by default
pub const DEFAULT_ALLOWED_CONTAINERS: &[&str] = &["mp4"];

/// Pick the highest-bitrate variant whose container is allowed
///
/// Containers are compared case-insensitively; on equal bitrates the
/// variant listed first wins.
///
/// ```
/// use pmogateway::AudioVariant;
/// use pmoplayer::select_variant;
///
/// let variants = vec![
///     AudioVariant::new("audio/mp4", 128_000, "https://a"),
///     AudioVariant::new("audio/webm", 256_000, "https://b"),
///     AudioVariant::new("audio/mp4", 256_000, "https://c"),
/// ];
/// let best = select_variant(&variants, &["mp4".to_string()]).unwrap();
/// assert_eq!(best.url, "https://c");
/// ```
pub fn select_variant<'a>(
    variants: &'a [AudioVariant],
    allowed_containers: &[String],
) -> Option<&'a AudioVariant> {
    variants
        .iter()
        .filter(|v| {
            let container = v.container();
            allowed_containers
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&container))
        })
        .fold(None, |best: Option<&AudioVariant>, v| match best {
            Some(b) if b.bitrate_bps >= v.bitrate_bps => Some(b),
            _ => Some(v),
        })
}

#[derive(Clone)]
pub struct StreamResolver {
    source: Arc<dyn MetadataSource>,
    allowed_containers: Vec<String>,
}

impl StreamResolver {
    pub fn new(source: Arc<dyn MetadataSource>, allowed_containers: Vec<String>) -> Self {
        Self {
            source,
            allowed_containers,
        }
    }

    pub fn allowed_containers(&self) -> &[String] {
        &self.allowed_containers
    }

    /// Fetch the manifest of `item` and pick its best variant
    pub async fn resolve(&self, item: &QueueItem) -> Result<AudioVariant, ResolutionFailure> {
        let variants = self.source.stream_manifest(&item.id).await.map_err(|e| {
            warn!(id = %item.id, "Stream manifest unavailable: {}", e);
            ResolutionFailure::ManifestUnavailable {
                id: item.id.clone(),
                reason: e.to_string(),
            }
        })?;

        match select_variant(&variants, &self.allowed_containers) {
            Some(variant) => {
                debug!(
                    id = %item.id,
                    mime_type = %variant.mime_type,
                    bitrate = variant.bitrate_bps,
                    "Stream resolved"
                );
                Ok(variant.clone())
            }
            None => {
                warn!(
                    id = %item.id,
                    variants = variants.len(),
                    allowed = ?self.allowed_containers,
                    "No acceptable audio variant"
                );
                Err(ResolutionFailure::NoAcceptableVariant {
                    id: item.id.clone(),
                })
            }
        }
    }
}

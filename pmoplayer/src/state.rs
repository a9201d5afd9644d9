//! Playback state published by the controller

use crate::queue::Queue;
use pmogateway::QueueItem;
use serde::Serialize;
use std::fmt;

/// Transport status of the single media output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PlayerStatus {
    #[default]
    Idle,
    Resolving,
    Playing,
    Paused,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Idle => "idle",
            PlayerStatus::Resolving => "resolving",
            PlayerStatus::Playing => "playing",
            PlayerStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of the last search, as shown in the results panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum SearchStatus {
    #[default]
    Idle,
    Searching { query: String },
    Ready { count: usize },
    Empty,
    Failed { message: String },
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStatus::Idle => f.write_str("Search for music to get started."),
            SearchStatus::Searching { query } => write!(f, "Searching for \"{}\"...", query),
            SearchStatus::Ready { count } => write!(f, "{} result(s)", count),
            SearchStatus::Empty => f.write_str("No results found."),
            SearchStatus::Failed { message } => write!(f, "Search failed: {}", message),
        }
    }
}

/// Snapshot of everything the controller owns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackState {
    pub queue: Queue,
    /// `None` or a valid index into `queue`
    pub current_index: Option<usize>,
    pub status: PlayerStatus,
    pub current_time_secs: f64,
    pub duration_secs: f64,
    /// Item bound to the media output, if any
    pub now_playing: Option<QueueItem>,
    pub search: SearchStatus,
}

impl PlaybackState {
    /// Playback progress in percent, 0 when the duration is unknown
    pub fn progress_percent(&self) -> f64 {
        if self.duration_secs > 0.0 && self.duration_secs.is_finite() {
            (self.current_time_secs / self.duration_secs * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    /// `"1:05 / 3:20"`
    pub fn time_display(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.current_time_secs),
            format_time(self.duration_secs)
        )
    }
}

/// Format seconds as `M:SS`
///
/// ```
/// use pmoplayer::format_time;
///
/// assert_eq!(format_time(65.9), "1:05");
/// assert_eq!(format_time(600.0), "10:00");
/// assert_eq!(format_time(f64::NAN), "0:00");
/// ```
pub fn format_time(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

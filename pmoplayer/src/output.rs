//! The single media output driven by the controller

use crate::controller::MediaEvents;
use anyhow::Result;
use tracing::info;

/// Generation number of a binding, given by the controller on every `bind`
pub type BindingId = u64;

/// Transport control of the media element
///
/// Only one variant is bound at a time; the controller always calls
/// [`stop`](MediaOutput::stop) before binding another one. Outputs report
/// position, end of stream and late failures through the [`MediaEvents`]
/// given to [`attach`](MediaOutput::attach), tagged with the binding they
/// belong to.
pub trait MediaOutput: Send + 'static {
    /// Called once by `spawn_player`, before any other call
    fn attach(&mut self, _events: MediaEvents) {}

    /// Load a stream URL (does not start playback)
    fn bind(&mut self, url: &str, binding: BindingId) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Release the current binding
    fn stop(&mut self) -> Result<()>;

    /// Jump to an absolute position in seconds
    fn seek(&mut self, position_secs: f64) -> Result<()>;
}

/// Output without audio: logs every call
///
/// Fallback of the console binary when no audio device can be opened. It
/// never reports media events, so tracks do not advance by themselves.
#[derive(Debug, Default)]
pub struct HeadlessOutput {
    bound_url: Option<String>,
}

impl HeadlessOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound_url(&self) -> Option<&str> {
        self.bound_url.as_deref()
    }
}

impl MediaOutput for HeadlessOutput {
    fn bind(&mut self, url: &str, binding: BindingId) -> Result<()> {
        info!(url = %url, binding, "🎵 Stream bound");
        self.bound_url = Some(url.to_string());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        info!("▶️ Play");
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        info!("⏸️ Pause");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        info!("⏹️ Stop");
        self.bound_url = None;
        Ok(())
    }

    fn seek(&mut self, position_secs: f64) -> Result<()> {
        info!(position_secs, "⏩ Seek");
        Ok(())
    }
}

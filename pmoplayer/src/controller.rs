//! Playback controller
//!
//! A single tokio task owns the [`PlaybackState`] and the [`MediaOutput`].
//! Every input is a message on one unbounded channel: user commands, media
//! events, and the completions of the searches and resolutions the actor
//! spawns. Completions carry a sequence token; only the latest token of each
//! kind is honoured, older results are dropped.
//!
//! Media events (position, end of stream, decoding errors) come back from the
//! output through [`MediaEvents`]. Each `bind` opens a new binding
//! generation; events tagged with a released binding are ignored.
//!
//! ```text
//!            select(i) in range          resolve ok
//!   Idle ─────────────────────▶ Resolving ──────────▶ Playing ◀──▶ Paused
//!    ▲                            │  ▲                    │   toggle
//!    │   out of range / max skips │  │ resolve failed:     │ ended / next
//!    └────────────────────────────┘  └── select(i + 1) ◀───┘
//! ```

use crate::client::MetadataSource;
use crate::error::{PlayerError, ResolutionFailure};
use crate::output::{BindingId, MediaOutput};
use crate::queue::Queue;
use crate::resolver::{DEFAULT_ALLOWED_CONTAINERS, StreamResolver};
use crate::search::SearchOrchestrator;
use crate::state::{PlaybackState, PlayerStatus, SearchStatus};
use pmogateway::AudioVariant;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Default bound on chained skip-forwards after playback failures
pub const DEFAULT_MAX_CONSECUTIVE_SKIPS: u32 = 25;

/// Tunables of the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSettings {
    /// Containers a variant must use to be playable (`mp4`, `webm`…)
    pub allowed_containers: Vec<String>,
    /// Skip-forwards in a row after failures before giving up, 0 = unlimited
    pub max_consecutive_skips: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            allowed_containers: DEFAULT_ALLOWED_CONTAINERS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            max_consecutive_skips: DEFAULT_MAX_CONSECUTIVE_SKIPS,
        }
    }
}

/// Commands accepted by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Search(String),
    SelectTrack(usize),
    TogglePlayPause,
    Next,
    Previous,
    /// Position in percent of the duration
    Seek(f64),
    /// Media event: position and duration in seconds
    TimeUpdate {
        binding: BindingId,
        current_secs: f64,
        duration_secs: f64,
    },
    /// Media event: the bound stream reached its end
    MediaEnded { binding: BindingId },
    /// Media event: the bound stream could not be fetched or decoded
    MediaError { binding: BindingId, message: String },
    Shutdown,
}

enum Message {
    Command(PlayerCommand),
    SearchCompleted {
        token: u64,
        result: Result<Option<Queue>, String>,
    },
    ResolutionCompleted {
        token: u64,
        index: usize,
        result: Result<AudioVariant, ResolutionFailure>,
    },
}

/// Cloneable handle to a running controller
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<Message>,
    state_rx: watch::Receiver<PlaybackState>,
}

impl PlayerHandle {
    pub fn send(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        self.tx
            .send(Message::Command(command))
            .map_err(|_| PlayerError::ControllerStopped)
    }

    pub fn search(&self, query: impl Into<String>) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Search(query.into()))
    }

    pub fn select_track(&self, index: usize) -> Result<(), PlayerError> {
        self.send(PlayerCommand::SelectTrack(index))
    }

    pub fn toggle_play_pause(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::TogglePlayPause)
    }

    pub fn next(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Next)
    }

    pub fn previous(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Previous)
    }

    pub fn seek(&self, percent: f64) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Seek(percent))
    }

    pub fn time_update(
        &self,
        binding: BindingId,
        current_secs: f64,
        duration_secs: f64,
    ) -> Result<(), PlayerError> {
        self.send(PlayerCommand::TimeUpdate {
            binding,
            current_secs,
            duration_secs,
        })
    }

    pub fn media_ended(&self, binding: BindingId) -> Result<(), PlayerError> {
        self.send(PlayerCommand::MediaEnded { binding })
    }

    pub fn media_error(
        &self,
        binding: BindingId,
        message: impl Into<String>,
    ) -> Result<(), PlayerError> {
        self.send(PlayerCommand::MediaError {
            binding,
            message: message.into(),
        })
    }

    pub fn shutdown(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Shutdown)
    }

    /// Latest published state
    pub fn state(&self) -> PlaybackState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_rx.clone()
    }
}

/// Channel handed to the [`MediaOutput`] to report media events
///
/// Holds a weak sender: it never keeps the controller alive. Every method
/// returns `false` once the controller is gone.
#[derive(Clone)]
pub struct MediaEvents {
    tx: mpsc::WeakUnboundedSender<Message>,
}

impl MediaEvents {
    pub fn time_update(&self, binding: BindingId, current_secs: f64, duration_secs: f64) -> bool {
        self.post(PlayerCommand::TimeUpdate {
            binding,
            current_secs,
            duration_secs,
        })
    }

    pub fn ended(&self, binding: BindingId) -> bool {
        self.post(PlayerCommand::MediaEnded { binding })
    }

    pub fn error(&self, binding: BindingId, message: impl Into<String>) -> bool {
        self.post(PlayerCommand::MediaError {
            binding,
            message: message.into(),
        })
    }

    fn post(&self, command: PlayerCommand) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(Message::Command(command)).is_ok(),
            None => false,
        }
    }
}

/// Spawn a controller on the current tokio runtime
pub fn spawn_player(
    source: Arc<dyn MetadataSource>,
    mut output: Box<dyn MediaOutput>,
    settings: PlayerSettings,
) -> PlayerHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(PlaybackState::default());

    output.attach(MediaEvents { tx: tx.downgrade() });

    let controller = PlaybackController {
        state: PlaybackState::default(),
        search: SearchOrchestrator::new(source.clone()),
        resolver: StreamResolver::new(source, settings.allowed_containers),
        output,
        bound: false,
        binding_token: 0,
        self_tx: tx.downgrade(),
        state_tx,
        search_token: 0,
        resolve_token: 0,
        consecutive_failures: 0,
        max_consecutive_skips: settings.max_consecutive_skips,
    };

    tokio::spawn(controller.run(rx));

    PlayerHandle { tx, state_rx }
}

struct PlaybackController {
    state: PlaybackState,
    search: SearchOrchestrator,
    resolver: StreamResolver,
    output: Box<dyn MediaOutput>,
    /// A variant is currently bound to the output
    bound: bool,
    /// Generation of the latest binding
    binding_token: BindingId,
    // Faible : le canal se ferme quand tous les handles sont lâchés
    self_tx: mpsc::WeakUnboundedSender<Message>,
    state_tx: watch::Sender<PlaybackState>,
    search_token: u64,
    resolve_token: u64,
    consecutive_failures: u32,
    max_consecutive_skips: u32,
}

impl PlaybackController {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        debug!("Playback controller started");

        while let Some(message) = rx.recv().await {
            match message {
                Message::Command(PlayerCommand::Shutdown) => break,
                Message::Command(command) => self.handle_command(command),
                Message::SearchCompleted { token, result } => {
                    self.on_search_completed(token, result)
                }
                Message::ResolutionCompleted {
                    token,
                    index,
                    result,
                } => self.on_resolution_completed(token, index, result),
            }
            self.publish();
        }

        if self.bound {
            self.stop_output();
        }
        debug!("Playback controller stopped");
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Search(query) => self.start_search(query),
            PlayerCommand::SelectTrack(index) => {
                self.consecutive_failures = 0;
                self.select_track(index);
            }
            PlayerCommand::TogglePlayPause => self.toggle_play_pause(),
            PlayerCommand::Next => {
                self.consecutive_failures = 0;
                self.next();
            }
            PlayerCommand::Previous => {
                self.consecutive_failures = 0;
                self.previous();
            }
            PlayerCommand::Seek(percent) => self.seek(percent),
            PlayerCommand::TimeUpdate { binding, .. }
            | PlayerCommand::MediaEnded { binding }
            | PlayerCommand::MediaError { binding, .. }
                if !self.is_current_binding(binding) =>
            {
                debug!(binding, current = self.binding_token, "Ignoring event from a released binding");
            }
            PlayerCommand::TimeUpdate {
                current_secs,
                duration_secs,
                ..
            } => self.time_update(current_secs, duration_secs),
            PlayerCommand::MediaEnded { .. } => {
                if self.state.status == PlayerStatus::Playing {
                    self.consecutive_failures = 0;
                    self.next();
                }
            }
            PlayerCommand::MediaError { message, .. } => self.on_media_error(message),
            PlayerCommand::Shutdown => {}
        }
    }

    // ------------------------------------------------------------------
    // Track selection
    // ------------------------------------------------------------------

    fn select_track(&mut self, index: usize) {
        // Toute résolution en vol devient obsolète
        self.resolve_token += 1;

        let Some(item) = self.state.queue.get(index).cloned() else {
            debug!(index, queue_len = self.state.queue.len(), "Selection out of range");
            self.settle_idle();
            return;
        };

        if self.bound {
            self.stop_output();
        }

        info!(index, id = %item.id, title = %item.title, "Resolving track");
        self.state.current_index = Some(index);
        self.state.status = PlayerStatus::Resolving;
        self.reset_times();

        let token = self.resolve_token;
        let resolver = self.resolver.clone();
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = resolver.resolve(&item).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Message::ResolutionCompleted {
                    token,
                    index,
                    result,
                });
            }
        });
    }

    fn on_resolution_completed(
        &mut self,
        token: u64,
        index: usize,
        result: Result<AudioVariant, ResolutionFailure>,
    ) {
        if token != self.resolve_token || self.state.status != PlayerStatus::Resolving {
            debug!(token, index, "Discarding stale resolution");
            return;
        }

        let Some(item) = self.state.queue.get(index).cloned() else {
            self.settle_idle();
            return;
        };

        match result.and_then(|variant| self.bind_and_play(&item.id, &variant)) {
            Ok(()) => {
                info!(index, id = %item.id, title = %item.title, "▶️ Now playing");
                self.state.status = PlayerStatus::Playing;
                self.state.now_playing = Some(item);
                self.reset_times();
                self.consecutive_failures = 0;
            }
            Err(failure) => {
                debug!(index, "Resolution failed: {}", failure);
                self.skip_after_failure(index);
            }
        }
    }

    /// Skip forward from `index`, unless the chain is already too long
    fn skip_after_failure(&mut self, index: usize) {
        self.consecutive_failures += 1;

        // N échecs d'affilée = N - 1 sauts déjà faits
        if self.max_consecutive_skips > 0 && self.consecutive_failures > self.max_consecutive_skips
        {
            warn!(
                skips = self.max_consecutive_skips,
                "Too many unplayable tracks in a row, stopping"
            );
            self.consecutive_failures = 0;
            self.settle_idle();
        } else {
            self.select_track(index + 1);
        }
    }

    /// The bound stream failed after `bind` was accepted
    fn on_media_error(&mut self, message: String) {
        warn!(binding = self.binding_token, "Media output failed: {}", message);
        match self.state.current_index {
            Some(index) => self.skip_after_failure(index),
            None => self.settle_idle(),
        }
    }

    fn is_current_binding(&self, binding: BindingId) -> bool {
        self.bound && binding == self.binding_token
    }

    fn bind_and_play(&mut self, id: &str, variant: &AudioVariant) -> Result<(), ResolutionFailure> {
        let rejected = |e: anyhow::Error| ResolutionFailure::OutputRejected {
            id: id.to_string(),
            reason: e.to_string(),
        };

        self.binding_token += 1;
        self.output
            .bind(&variant.url, self.binding_token)
            .map_err(rejected)?;
        self.bound = true;

        if let Err(e) = self.output.play() {
            self.stop_output();
            return Err(rejected(e));
        }
        Ok(())
    }

    /// No selection, nothing bound
    fn settle_idle(&mut self) {
        if self.bound {
            self.stop_output();
        }
        self.state.current_index = None;
        self.state.status = PlayerStatus::Idle;
        self.state.now_playing = None;
        self.reset_times();
    }

    fn stop_output(&mut self) {
        if let Err(e) = self.output.stop() {
            error!("Media output failed to stop: {}", e);
        }
        self.bound = false;
        self.state.now_playing = None;
    }

    fn reset_times(&mut self) {
        self.state.current_time_secs = 0.0;
        self.state.duration_secs = 0.0;
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    fn toggle_play_pause(&mut self) {
        match self.state.status {
            PlayerStatus::Playing => match self.output.pause() {
                Ok(()) => self.state.status = PlayerStatus::Paused,
                Err(e) => error!("Media output failed to pause: {}", e),
            },
            PlayerStatus::Paused => match self.output.play() {
                Ok(()) => self.state.status = PlayerStatus::Playing,
                Err(e) => error!("Media output failed to resume: {}", e),
            },
            PlayerStatus::Idle | PlayerStatus::Resolving => {}
        }
    }

    fn next(&mut self) {
        let index = self.state.current_index.map_or(0, |i| i + 1);
        self.select_track(index);
    }

    fn previous(&mut self) {
        match self.state.current_index {
            Some(0) => {
                self.resolve_token += 1;
                self.settle_idle();
            }
            Some(i) => self.select_track(i - 1),
            // Piste d'une file précédente encore liée : on la libère
            None if self.bound => {
                self.resolve_token += 1;
                self.settle_idle();
            }
            None => {}
        }
    }

    fn time_update(&mut self, current_secs: f64, duration_secs: f64) {
        if !matches!(
            self.state.status,
            PlayerStatus::Playing | PlayerStatus::Paused
        ) {
            return;
        }
        self.state.current_time_secs = sanitize_secs(current_secs);
        self.state.duration_secs = sanitize_secs(duration_secs);
    }

    fn seek(&mut self, percent: f64) {
        let duration = self.state.duration_secs;
        if duration <= 0.0 || percent.is_nan() {
            return;
        }

        let position = percent.clamp(0.0, 100.0) / 100.0 * duration;
        self.state.current_time_secs = position;
        if let Err(e) = self.output.seek(position) {
            error!(position, "Media output failed to seek: {}", e);
        }
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    fn start_search(&mut self, query: String) {
        let query = query.trim().to_string();
        if query.is_empty() {
            return;
        }

        self.search_token += 1;
        self.state.search = SearchStatus::Searching {
            query: query.clone(),
        };

        let token = self.search_token;
        let search = self.search.clone();
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = search.search(&query).await.map_err(|e| e.to_string());
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Message::SearchCompleted { token, result });
            }
        });
    }

    fn on_search_completed(&mut self, token: u64, result: Result<Option<Queue>, String>) {
        if token != self.search_token {
            debug!(token, "Discarding stale search");
            return;
        }

        let queue = match result {
            Ok(Some(queue)) => queue,
            Ok(None) => return,
            Err(message) => {
                warn!("Search failed: {}", message);
                // La file et la lecture en cours sont conservées
                self.state.search = SearchStatus::Failed { message };
                return;
            }
        };

        self.state.search = if queue.is_empty() {
            SearchStatus::Empty
        } else {
            SearchStatus::Ready { count: queue.len() }
        };
        self.state.queue = queue;
        self.state.current_index = None;

        if self.state.status == PlayerStatus::Resolving {
            self.resolve_token += 1;
            self.state.status = PlayerStatus::Idle;
            self.reset_times();
        }
    }
}

fn sanitize_secs(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

//! PMOTube client core
//!
//! - [`client`] : accès au proxy ([`ProxyClient`], [`ProxyGateway`]) derrière
//!   le trait [`MetadataSource`]
//! - [`search`] : requête → [`Queue`] d'éléments jouables
//! - [`resolver`] : élément → meilleure [`AudioVariant`](pmogateway::AudioVariant)
//! - [`controller`] : acteur tokio qui pilote l'unique [`MediaOutput`]
//! - `rodio_output` (feature `rodio`) : sortie audio locale
//!
//! # Exemple
//!
//! ```no_run
//! use pmoplayer::{HeadlessOutput, PlayerSettings, ProxyGateway, spawn_player};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let source = Arc::new(ProxyGateway::from_config()?);
//! let player = spawn_player(source, Box::new(HeadlessOutput::new()), PlayerSettings::default());
//!
//! player.search("lofi")?;
//! let mut states = player.subscribe();
//! states
//!     .wait_for(|s| matches!(s.search, pmoplayer::SearchStatus::Ready { .. }))
//!     .await?;
//! player.select_track(0)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod controller;
pub mod error;
pub mod output;
pub mod queue;
pub mod resolver;
pub mod search;
pub mod state;

#[cfg(feature = "rodio")]
pub mod rodio_output;

#[cfg(feature = "pmoconfig")]
pub mod config_ext;

pub use client::{MetadataSource, ProxyClient, ProxyGateway};
pub use controller::{
    DEFAULT_MAX_CONSECUTIVE_SKIPS, MediaEvents, PlayerCommand, PlayerHandle, PlayerSettings, spawn_player,
};
pub use error::{PlayerError, ResolutionFailure, Result};
pub use output::{BindingId, HeadlessOutput, MediaOutput};
pub use pmogateway::{AudioVariant, ItemKind, QueueItem};
pub use queue::Queue;
pub use resolver::{StreamResolver, select_variant};
pub use search::SearchOrchestrator;
pub use state::{PlaybackState, PlayerStatus, SearchStatus, format_time};

#[cfg(feature = "rodio")]
pub use rodio_output::RodioOutput;

#[cfg(feature = "pmoconfig")]
pub use config_ext::{DEFAULT_PROXY_URL, PlayerConfigExt};

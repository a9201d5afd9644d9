//! Upstream metadata gateway for PMOTube
//!
//! This crate knows how to talk to the public media-metadata APIs PMOTube
//! relies on, without doing any I/O itself:
//!
//! - **Piped** (`/search`, `/streams/{id}`, spoofed `Origin` header)
//! - **Invidious** (`/api/v1/search`, `/api/v1/videos/{id}`)
//!
//! Each adapter implements [`UpstreamProvider`], which builds upstream URLs
//! and headers (used by `pmoproxy`) and decodes response bodies into the
//! provider-neutral [`QueueItem`] and [`AudioVariant`] models (used by
//! `pmoplayer`).
//!
//! # Example
//!
//! ```
//! use pmogateway::{build_provider, ProviderKind, ProviderSettings};
//!
//! let provider = build_provider(&ProviderSettings::new(
//!     ProviderKind::Invidious,
//!     "https://yewtu.be",
//! ))
//! .unwrap();
//!
//! let url = provider.search_url("lofi").unwrap();
//! assert_eq!(url.as_str(), "https://yewtu.be/api/v1/search?q=lofi&type=video");
//! ```
//!
//! # Configuration Extension
//!
//! With the `pmoconfig` feature (enabled by default) the provider is read
//! from the `upstream` section of the configuration:
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmogateway::{build_provider, GatewayConfigExt};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! let provider = build_provider(&config.get_provider_settings()?)?;
//! println!("Using {} at {}", provider.kind(), provider.base_url());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod invidious;
pub mod models;
pub mod piped;
pub mod provider;

#[cfg(feature = "pmoconfig")]
pub mod config_ext;

pub use error::{GatewayError, Result};
pub use invidious::{DEFAULT_INVIDIOUS_BASE_URL, InvidiousProvider};
pub use models::{AudioVariant, ItemKind, QueueItem};
pub use piped::{DEFAULT_PIPED_BASE_URL, DEFAULT_PIPED_ORIGIN, PipedProvider};
pub use provider::{ProviderKind, ProviderSettings, UpstreamProvider, build_provider};

#[cfg(feature = "pmoconfig")]
pub use config_ext::{DEFAULT_PROVIDER, DEFAULT_REQUEST_TIMEOUT_SECS, GatewayConfigExt};

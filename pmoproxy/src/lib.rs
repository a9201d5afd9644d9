//! Stateless metadata proxy for PMOTube
//!
//! The proxy accepts a normalised query and turns it into exactly one call
//! to the configured upstream API (Piped or Invidious), relaying the JSON
//! answer with CORS headers so that browser and console clients can use it.
//!
//! | `endpoint` | parameter | upstream |
//! |---|---|---|
//! | `search` | `q` | provider search, music filter |
//! | `stream` | `videoId` (or `id`) | provider stream manifest |
//!
//! Failures map to HTTP statuses: 400 for malformed calls, the upstream
//! status for upstream errors, 502 for non-JSON upstream answers and 500
//! for local transport faults.
//!
//! # Example
//!
//! ```no_run
//! use pmogateway::PipedProvider;
//! use pmoproxy::{ProxyRequest, ProxyTranslator};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let provider = PipedProvider::new("https://pipedapi.in.projectsegfau.lt")?;
//! let translator = ProxyTranslator::new(Arc::new(provider))?;
//!
//! let json = translator
//!     .forward(&ProxyRequest::Search { query: "lofi".into() })
//!     .await?;
//! println!("{} bytes", json.body.len());
//! # Ok(())
//! # }
//! ```

pub mod api_rest;
pub mod error;
pub mod request;
pub mod translator;

#[cfg(feature = "server")]
pub mod pmoserver_ext;
#[cfg(feature = "server")]
mod pmoserver_impl;

pub use api_rest::create_router;
pub use error::{ProxyError, Result};
pub use request::{ProxyQuery, ProxyRequest};
pub use translator::{ProxyTranslator, ProxyTranslatorBuilder, UpstreamJson};

#[cfg(feature = "server")]
pub use pmoserver_ext::{PROXY_ROUTE, ProxyExt};

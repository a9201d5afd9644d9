//! # pmoserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit l'enveloppe HTTP commune de PMOTube : un serveur Axum
//! sur lequel les autres crates montent leurs routes via des traits
//! d'extension (voir `pmoproxy::ProxyExt`), et l'initialisation de `tracing`.
//!
//! ## Fonctionnalités
//!
//! - 🚀 **API de haut niveau** : Interface simple pour créer des serveurs HTTP avec Axum
//! - 📜 **Logs** : Subscriber `tracing` configuré depuis pmoconfig, niveau modifiable à chaud
//! - ℹ️ **Info** : Route `/info` (nom, version, adresse)
//! - ⚡ **Arrêt gracieux** : Gestion propre de l'arrêt sur Ctrl+C
//!
//! ## Architecture
//!
//! - [`server`] : Implémentation du serveur principal et du builder
//! - [`logs`] : Initialisation du logging et API `/api/logs/log_setup`
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use pmoserver::ServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new_configured().build();
//!     server.init_logging().await;
//!     server.add_info_route().await;
//!
//!     // Ajout d'une route JSON
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, init_logging};
pub use server::{DEFAULT_SERVER_NAME, Server, ServerBuilder, ServerInfo};

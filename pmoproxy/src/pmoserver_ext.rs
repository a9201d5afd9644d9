//! Extension pmoserver pour le proxy
//!
//! Ce module fournit un trait d'extension pour monter le proxy sur un
//! serveur pmoserver, sans que pmoserver dépende de pmoproxy.

use crate::translator::ProxyTranslator;
use anyhow::Result;
use std::sync::Arc;

/// Chemin de montage du proxy
pub const PROXY_ROUTE: &str = "/api/proxy";

/// Trait pour étendre pmoserver avec le proxy
///
/// # Exemple
///
/// ```rust,no_run
/// use pmoproxy::ProxyExt;
/// use pmoserver::ServerBuilder;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = ServerBuilder::new_configured().build();
///     server.init_proxy().await?;
///
///     server.start().await?;
///     server.wait().await;
///     Ok(())
/// }
/// ```
pub trait ProxyExt {
    /// Construit le traducteur depuis la configuration et monte la route
    ///
    /// # Routes enregistrées
    ///
    /// - `GET /api/proxy?endpoint=search&q=…`
    /// - `GET /api/proxy?endpoint=stream&videoId=…`
    async fn init_proxy(&mut self) -> Result<Arc<ProxyTranslator>>;

    /// Monte la route avec un traducteur existant
    async fn init_proxy_with(
        &mut self,
        translator: ProxyTranslator,
    ) -> Result<Arc<ProxyTranslator>>;
}

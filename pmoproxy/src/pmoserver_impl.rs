//! Implémentation du trait ProxyExt pour pmoserver::Server

use crate::api_rest::create_router;
use crate::pmoserver_ext::{PROXY_ROUTE, ProxyExt};
use crate::translator::ProxyTranslator;
use anyhow::Result;
use pmoserver::Server;
use std::sync::Arc;
use tracing::info;

impl ProxyExt for Server {
    async fn init_proxy(&mut self) -> Result<Arc<ProxyTranslator>> {
        info!("Initializing metadata proxy...");
        let translator = ProxyTranslator::from_config()?;
        self.init_proxy_with(translator).await
    }

    async fn init_proxy_with(
        &mut self,
        translator: ProxyTranslator,
    ) -> Result<Arc<ProxyTranslator>> {
        let translator = Arc::new(translator);
        self.add_router(PROXY_ROUTE, create_router(translator.clone()))
            .await;

        info!(
            provider = %translator.provider().kind(),
            upstream = %translator.provider().base_url(),
            "Proxy available at {}",
            PROXY_ROUTE
        );

        Ok(translator)
    }
}

mod console;

use pmoconfig::get_config;
use pmoplayer::{
    HeadlessOutput, MediaOutput, PlayerConfigExt, ProxyGateway, RodioOutput, spawn_player,
};
use pmoproxy::ProxyExt;
use pmoserver::ServerBuilder;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Serveur HTTP ==========

    let mut server = ServerBuilder::new_configured()
        .version(env!("CARGO_PKG_VERSION"))
        .build();

    server.init_logging().await;
    server.add_info_route().await;

    info!("📡 Initializing upstream proxy...");
    server.init_proxy().await?;

    info!("🌐 Starting HTTP server...");
    server.start().await?;

    // ========== PHASE 2 : Lecteur ==========

    let config = get_config();
    let source = Arc::new(ProxyGateway::from_config()?);
    info!(endpoint = %source.client().endpoint(), "🎵 Player uses proxy");

    let output: Box<dyn MediaOutput> = match RodioOutput::new() {
        Ok(output) => Box::new(output),
        Err(e) => {
            warn!("⚠️ No audio output ({:#}), playback will be silent", e);
            Box::new(HeadlessOutput::new())
        }
    };

    let player = spawn_player(source, output, config.get_player_settings()?);

    info!("✅ PMOTube is ready!");
    info!("Press Ctrl+C or type 'quit' to stop...");

    tokio::select! {
        _ = server.wait() => info!("Server stopped"),
        result = console::run(player.clone()) => {
            if let Err(e) = result {
                warn!("⚠️ Console stopped: {}", e);
            }
        }
    }

    let _ = player.shutdown();
    Ok(())
}

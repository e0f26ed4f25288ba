//! N-gon Pong Game Server
//!
//! Authoritative WebSocket server. Every session runs the deterministic
//! simulation at a fixed tick rate and broadcasts its board to the seated
//! players.

use anyhow::Context;
use tracing::info;

use ngon_pong::{
    TICK_RATE, VERSION,
    network::{GameServer, ServerConfig},
};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional local overrides
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServerConfig::from_env();
    info!("N-gon Pong Server v{}", VERSION);
    info!("Tick Rate: {} Hz (default {})", config.tick_rate, TICK_RATE);

    let server = std::sync::Arc::new(GameServer::new(config.clone()));

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            signal_server.shutdown();
        }
    });

    server
        .run()
        .await
        .with_context(|| format!("server on {} failed", config.bind_addr))?;

    info!("Server stopped");
    Ok(())
}

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use docuchat::{config::Config, routes::create_router, storage, utils::init_logger, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logger(&config.logging);
    info!("Configuration loaded: {:?}", config.server);

    storage::ensure_layout(&config.storage).with_context(|| {
        format!(
            "Failed to create storage directories under {}",
            config.storage.base_dir.display()
        )
    })?;

    // Create shared state
    let state = AppState::new(config.clone())?;

    // Expire idle sessions and release their uploads
    state.sessions.spawn_sweeper(
        Duration::from_secs(config.session.idle_timeout_secs),
        state.storage(),
    );

    // Create router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid HOST/PORT")?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

//! Turbocache Server - self-hosted remote build cache
//!
//! Stores build artifacts per team and reports how much compute time the
//! cache saved.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use turbocache_server::{start_server, Config, Result, ServerError, ServerState, SharedState};
use turbocache_store::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("turbocache_server=info".parse()?)
        .add_directive("turbocache_store=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Turbocache server...");

    let config = Config::from_env()?;
    info!("Port: {}", config.port);
    info!("API version: {}", config.api_version);
    info!("Storage dir: {:?}", config.storage_dir);
    info!("Accepted tokens: {}", config.tokens.len());
    info!("Compute time accounting: {:?}", config.accounting);

    let storage = Storage::open(&config.storage_dir)
        .await?
        .with_accounting(config.accounting);

    let state: SharedState = Arc::new(ServerState::new(storage, &config));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| ServerError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

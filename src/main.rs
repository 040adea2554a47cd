//! peeper-gateway server entry point.
//!
//! Starts the Axum HTTP server with the REST event log and the two relay
//! WebSocket endpoints.

use tracing_subscriber::EnvFilter;

use peeper_gateway::app_state::AppState;
use peeper_gateway::config::{GatewayConfig, LogFormat};
use peeper_gateway::persistence::{EventLog, PostgresEventLog};
use peeper_gateway::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(addr = %config.listen_addr, "starting peeper-gateway");

    // Build persistence layer
    let event_log = if config.persistence_enabled {
        EventLog::Postgres(PostgresEventLog::connect(&config).await?)
    } else {
        tracing::warn!("persistence disabled, event log is in-memory only");
        EventLog::in_memory()
    };

    // Build application state
    let state = AppState::new(config.relay, event_log);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    server::serve(listener, state, server::shutdown_signal()).await?;

    Ok(())
}

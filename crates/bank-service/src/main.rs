//! Bank Service - HTTP API for users, accounts and transfers
//!
//! This is the main entry point for the bank service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bank_service::{create_router, AppState, ServiceConfig};
use bank_store::PgStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bank=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bank Service");

    // Load configuration from environment; missing secrets abort startup
    let config = ServiceConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        db_max_connections = config.db_max_connections,
        db_lock_timeout_ms = config.db_lock_timeout_ms,
        "Service configuration loaded"
    );

    // Connect to PostgreSQL and bring the schema up to date
    let store = PgStore::connect(&config.database_url, &config.store_options()).await?;
    store.migrate().await?;

    // Build app state
    let state = AppState::new(Arc::new(store), config.clone())?;

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

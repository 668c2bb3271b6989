//! # urbo-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the URBO ticket service.
//! Binds to a configurable port (default 8080).

use urbo_api::state::AppConfig;
use urbo_identity_client::{IdentityClient, IdentityConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let user_cache_ttl_secs: u64 = std::env::var("USER_CACHE_TTL_SECS")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(300);
    let config = AppConfig {
        port,
        user_cache_ttl_secs,
    };

    // The identity client is required — every request is authenticated
    // against it.
    let identity_config = IdentityConfig::from_env().map_err(|e| {
        tracing::error!("identity client configuration failed: {e}");
        e
    })?;
    tracing::info!(base_url = %identity_config.base_url, "identity client configured");
    let identity = IdentityClient::new(identity_config).map_err(|e| {
        tracing::error!("failed to create identity client: {e}");
        e
    })?;

    // Initialize database pool (optional — absent means in-memory only).
    let db_pool = urbo_api::db::init_pool().await.map_err(|e| {
        tracing::error!("database initialization failed: {e}");
        e
    })?;

    let state = urbo_api::AppState::with_config(config, identity, db_pool);

    // Hydrate the in-memory store from the database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("database hydration failed: {e}");
        e
    })?;

    let app = urbo_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("URBO ticket service listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

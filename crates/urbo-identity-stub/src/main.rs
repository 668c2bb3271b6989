//! Identity service stub — standalone development server.
//!
//! Seeds one admin and one organization account on startup and logs their
//! tokens, so a local ticket service can be exercised immediately.

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use urbo_identity_stub::{routes, store, StubUser};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("IDENTITY_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5001);

    let state = store::AppState::new();
    seed_default_accounts(&state);

    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("urbo-identity-stub listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}

/// Seed an admin and an organization account, logging their tokens.
fn seed_default_accounts(state: &store::AppState) {
    let admin_token = state.register(StubUser {
        id: Uuid::new_v4(),
        name: "Admin".to_string(),
        email: "admin@example.com".to_string(),
        document_type: Some("cpf".to_string()),
        role: Some("admin".to_string()),
    });
    let org_token = state.register(StubUser {
        id: Uuid::new_v4(),
        name: "Prefeitura".to_string(),
        email: "prefeitura@example.com".to_string(),
        document_type: Some("cnpj".to_string()),
        role: Some("organization".to_string()),
    });
    tracing::info!(token = %admin_token, "seeded admin account");
    tracing::info!(token = %org_token, "seeded organization account");
}

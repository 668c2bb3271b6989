//! # urbo-api — Axum Ticket Service for URBO
//!
//! The top of the workspace DAG: assembles the ticket routes, the auth
//! middleware that resolves principals against the identity service, and
//! the shared application state.
//!
//! ## API Surface
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `POST /tickets` | Report an issue (individual) |
//! | `GET /tickets` | Role-filtered listing with status/location filters |
//! | `GET /tickets/stats` | Aggregate counts (organization/admin) |
//! | `GET /tickets/{id}` | Single ticket, decorated with display info |
//! | `PUT /tickets/{id}` | Edit descriptive fields (owner/admin) |
//! | `DELETE /tickets/{id}` | Hard delete (admin) |
//! | `PATCH /tickets/{id}/assign` | Claim an open ticket (organization) |
//! | `PATCH /tickets/{id}/complete` | Resolve a claimed ticket (assignee) |
//! | `PATCH /tickets/{id}/feedback` | Owner feedback on a resolved ticket |
//! | `PATCH /tickets/{id}/status` | Legacy status override (deprecated) |
//! | `GET /openapi.json` | Generated OpenAPI document |
//! | `GET /health/*` | Unauthenticated probes |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → principal_middleware (identity verification) → Handler
//! ```
//!
//! Health probes are mounted outside the auth middleware so they remain
//! accessible without credentials.

pub mod auth;
pub mod cache;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the full application router with all routes and middleware.
///
/// Body size limit: 1 MiB — ticket payloads are text; image uploads are
/// stored elsewhere and referenced by `image_ref`.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::tickets::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(from_fn_with_state(state.clone(), auth::principal_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application can serve traffic.
///
/// Checks:
/// - The ticket store is accessible.
/// - Database connection is healthy (when configured).
/// - The identity service answers its health endpoint — without it no
///   request can be authenticated, so the instance is not ready.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    // Store lock acquirable (not deadlocked).
    let _ = state.tickets.len();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    if let Err(e) = state.identity.health().await {
        tracing::warn!("identity service health check failed: {e}");
        return (StatusCode::SERVICE_UNAVAILABLE, "identity service unreachable").into_response();
    }

    (StatusCode::OK, "ready").into_response()
}

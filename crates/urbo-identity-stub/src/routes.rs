//! Route definitions for the identity service stub.
//!
//! Implements the endpoints that `urbo-identity-client` actually calls
//! (`/verify-token`, `/user/{id}`, `/health`) plus `/register` for seeding
//! users and minting tokens in tests and local development.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::store::{AppState, StubUser};

/// Build the complete router with all identity stub routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/verify-token", post(verify_token))
        .route("/user/:id", get(get_user))
        // Fallback: 501 Not Implemented
        .fallback(not_implemented)
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "service": "identity-stub"
    }))
}

// ── Registration ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    #[serde(default)]
    document_type: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    let user = StubUser {
        id: Uuid::new_v4(),
        name: body.name,
        email: body.email,
        document_type: body.document_type,
        // The real service defaults the role column to 'user'.
        role: body.role.or_else(|| Some("user".to_string())),
    };
    let id = user.id;
    let token = state.register(user);

    tracing::info!(user = %id, "registered stub user");
    (StatusCode::CREATED, Json(json!({ "id": id, "token": token }))).into_response()
}

// ── Token verification ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VerifyTokenRequest {
    token: String,
}

async fn verify_token(
    State(state): State<AppState>,
    Json(body): Json<VerifyTokenRequest>,
) -> Response {
    let user = state
        .tokens()
        .get(&body.token)
        .and_then(|entry| state.users().get(entry.value()).map(|u| u.value().clone()));

    match user {
        Some(user) => Json(json!({ "valid": true, "user": user })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "valid": false, "error": "invalid token" })),
        )
            .into_response(),
    }
}

// ── User lookup ─────────────────────────────────────────────────────

async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    // The contract requires a bearer credential; any non-empty one is
    // accepted here — credential policy is the real service's concern.
    let has_bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Bearer ") && v.len() > 7)
        .unwrap_or(false);
    if !has_bearer {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing bearer token" })),
        )
            .into_response();
    }

    match state.users().get(&id) {
        Some(entry) => Json(json!({ "user": entry.value().clone() })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "user not found" })),
        )
            .into_response(),
    }
}

async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}

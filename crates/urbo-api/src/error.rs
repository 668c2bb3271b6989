//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from urbo-state and urbo-identity-client to HTTP
//! status codes with JSON bodies. Never exposes internal error details in
//! responses.
//!
//! Two mappings matter most here:
//!
//! - Lifecycle precondition violations ([`urbo_state::TicketError`]) are
//!   **409 Conflict**, with the current status and attempted action in the
//!   message so the client can react.
//! - Identity failures stay split: a rejected token is **401**, an
//!   unreachable identity service is **503**. The legacy system collapsed
//!   both into 401; this one does not.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses use this format for consistency across the API
/// surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure — missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure — role or ownership mismatch (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The ticket's lifecycle state does not permit the action (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// A required upstream dependency (identity service, storage) is
    /// unreachable or unusable (503). Detail is logged, not returned.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal/upstream error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Unavailable(_) => "A required upstream service is unavailable".to_string(),
            other => other.to_string(),
        };

        // Log server-side errors for operator visibility.
        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Unavailable(_) => tracing::error!(error = %self, "upstream unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Lifecycle precondition violations are conflicts. The message carries the
/// current status and the attempted action (see `TicketError`'s Display).
impl From<urbo_state::TicketError> for AppError {
    fn from(err: urbo_state::TicketError) -> Self {
        Self::Conflict(err.to_string())
    }
}

/// Policy denials are forbidden.
impl From<urbo_state::PolicyError> for AppError {
    fn from(err: urbo_state::PolicyError) -> Self {
        Self::Forbidden(err.to_string())
    }
}

/// Identity client failures keep their two kinds distinct: credential
/// problems surface as 401, reachability problems as 503.
impl From<urbo_identity_client::IdentityError> for AppError {
    fn from(err: urbo_identity_client::IdentityError) -> Self {
        use urbo_identity_client::IdentityError as E;
        match &err {
            E::InvalidToken { .. } | E::InvalidPrincipal(_) => Self::Unauthorized(err.to_string()),
            E::Unavailable { .. } | E::Upstream { .. } | E::Deserialization { .. } => {
                Self::Unavailable(err.to_string())
            }
            E::Config(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use urbo_core::{TicketId, UserId};

    #[test]
    fn not_found_status_code() {
        let err = AppError::NotFound("missing ticket".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn validation_maps_to_400() {
        let err = AppError::Validation("title must not be empty".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = AppError::Conflict("cannot assign".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "CONFLICT");
    }

    #[test]
    fn unavailable_maps_to_503() {
        let err = AppError::Unavailable("identity service down".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "UPSTREAM_UNAVAILABLE");
    }

    #[test]
    fn ticket_error_converts_to_conflict_with_detail() {
        let mut ticket = urbo_state::Ticket::new(
            TicketId::new(),
            "t".into(),
            "d".into(),
            "a".into(),
            None,
            UserId::new(),
            Utc::now(),
        );
        let err = ticket.complete(UserId::new(), Utc::now()).unwrap_err();
        let app_err = AppError::from(err);
        let (status, _) = app_err.status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        // Detail for the client: current status and attempted action.
        let msg = app_err.to_string();
        assert!(msg.contains("complete"));
        assert!(msg.contains("OPEN"));
    }

    #[test]
    fn policy_error_converts_to_forbidden() {
        let principal = urbo_core::Principal {
            id: UserId::new(),
            role: urbo_core::Role::Individual,
        };
        let err = urbo_state::authorize(&principal, None, urbo_state::TicketAction::Assign)
            .unwrap_err();
        let app_err = AppError::from(err);
        let (status, _) = app_err.status_and_code();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn invalid_token_converts_to_unauthorized() {
        let err = urbo_identity_client::IdentityError::InvalidToken {
            status: 401,
            body: "{}".into(),
        };
        let (status, _) = AppError::from(err).status_and_code();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unreachable_identity_is_not_a_401() {
        // The split the legacy system missed: transport failures must not
        // masquerade as credential failures.
        let principal_err = urbo_core::Role::from_claims(None, None).unwrap_err();
        let invalid = urbo_identity_client::IdentityError::InvalidPrincipal(principal_err);
        let (status, _) = AppError::from(invalid).status_and_code();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let upstream = urbo_identity_client::IdentityError::Upstream {
            endpoint: "POST /verify-token".into(),
            status: 500,
            body: String::new(),
        };
        let (status, code) = AppError::from(upstream).status_and_code();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "UPSTREAM_UNAVAILABLE");
    }

    // ── into_response tests ──────────────────────────────────────

    use http_body_util::BodyExt;

    /// Helper to extract status and body from a Response.
    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn into_response_conflict_keeps_detail() {
        let (status, body) =
            response_parts(AppError::Conflict("status is OPEN, requires IN_PROGRESS".into()))
                .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error.code, "CONFLICT");
        assert!(body.error.message.contains("OPEN"));
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            !body.error.message.contains("db connection"),
            "internal error details must not leak: {}",
            body.error.message
        );
    }

    #[tokio::test]
    async fn into_response_unavailable_hides_details() {
        let (status, body) =
            response_parts(AppError::Unavailable("identity at 10.0.0.3 refused".into())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.error.message.contains("10.0.0.3"));
        assert_eq!(body.error.code, "UPSTREAM_UNAVAILABLE");
    }
}

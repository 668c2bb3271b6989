//! # Authentication Middleware
//!
//! Resolves the caller's `Authorization: Bearer` token into a verified
//! [`Principal`] by calling the identity service on every request — tokens
//! are short-lived and verification is where revocation takes effect, so
//! there is no local token cache.
//!
//! The middleware keeps the two failure kinds distinct:
//!
//! - missing/malformed header, rejected token → **401**
//! - identity service unreachable → **503**
//!
//! On success the [`Principal`] is injected into request extensions;
//! handlers extract it via the [`Caller`] extractor.

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use urbo_core::Principal;
use urbo_identity_client::IdentityError;

use crate::error::{AppError, ErrorBody, ErrorDetail};
use crate::state::AppState;

/// The verified caller, extracted from request extensions.
///
/// Present on every request that passed the auth middleware.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .map(Caller)
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Extract and verify the bearer token, injecting the [`Principal`].
///
/// Every request re-verifies its token against the identity service; the
/// in-flight call is abandoned if the client disconnects (the handler
/// future is dropped before any state mutation).
pub async fn principal_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(value) if value.starts_with("Bearer ") => &value[7..],
        Some(_) => {
            tracing::warn!("authentication failed: non-Bearer authorization scheme");
            return unauthorized_response("authorization header must use Bearer scheme");
        }
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            return unauthorized_response("missing authorization header");
        }
    };

    match state.identity.verify_token(token).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err @ (IdentityError::InvalidToken { .. } | IdentityError::InvalidPrincipal(_))) => {
            tracing::warn!(reason = %err, "authentication failed: token rejected");
            unauthorized_response("invalid or expired token")
        }
        Err(err) => {
            // Unreachable identity service is NOT an authentication
            // failure — surface it as 503 so clients can retry.
            AppError::from(err).into_response()
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

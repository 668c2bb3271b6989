//! # urbo-identity-client — Typed Client for the Identity Service
//!
//! The ONLY crate in the workspace that speaks HTTP to the identity service.
//! It resolves opaque bearer tokens into verified [`Principal`]s and fetches
//! per-id user profiles for response decoration.
//!
//! ## Endpoints Consumed
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/verify-token` | Exchange an opaque token for a user record |
//! | GET    | `/user/{id}` | Fetch a user's display profile |
//!
//! ## Failure Classification
//!
//! The two failure kinds the legacy system conflated into one 401 are kept
//! distinct end-to-end:
//!
//! - [`IdentityError::InvalidToken`] — the identity service answered and
//!   rejected the credential (4xx).
//! - [`IdentityError::Unavailable`] — the identity service could not be
//!   reached (transport error, timeout, or a 5xx from the service itself).
//!
//! Callers map the first to 401 and the second to 503; retry logic treats
//! only the second as retryable.
//!
//! ## No Token Cache
//!
//! Every request re-verifies its token. Tokens are short-lived (1-hour
//! expiry owned by the identity service) and verification is the one place
//! revocation can take effect.

pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use config::{ConfigError, IdentityConfig};
pub use error::IdentityError;
pub use types::{RawUser, UserProfile};

use std::time::Duration;

use urbo_core::{Principal, Role, UserId};

/// Typed client for the identity service.
///
/// Cheap to clone; the underlying `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: url::Url,
    service_token: Option<String>,
}

impl IdentityClient {
    /// Create a new client from configuration.
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IdentityError::Unavailable {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
            service_token: config.service_token,
        })
    }

    /// Exchange an opaque bearer token for a verified [`Principal`].
    ///
    /// Calls `POST {base}/verify-token`. The raw user record's `role` and
    /// `document_type` claims are consolidated into a single [`Role`] here,
    /// exactly once — downstream code never branches on the raw strings.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::InvalidToken`] — the service rejected the token.
    /// - [`IdentityError::InvalidPrincipal`] — the token was accepted but
    ///   the record's role claims are unresolvable.
    /// - [`IdentityError::Unavailable`] — transport failure, timeout, or a
    ///   5xx from the service.
    pub async fn verify_token(&self, token: &str) -> Result<Principal, IdentityError> {
        let endpoint = "POST /verify-token";
        let url = format!("{}verify-token", self.base_url);
        let body = types::VerifyTokenRequest { token };

        let resp = retry::retry_send(|| self.http.post(&url).json(&body).send())
            .await
            .map_err(|e| IdentityError::Unavailable {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let status = resp.status();
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Upstream {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "token verification rejected");
            return Err(IdentityError::InvalidToken {
                status: status.as_u16(),
                body,
            });
        }

        let verified: types::VerifyTokenResponse =
            resp.json().await.map_err(|e| IdentityError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let role = Role::from_claims(
            verified.user.role.as_deref(),
            verified.user.document_type.as_deref(),
        )?;

        Ok(Principal {
            id: UserId(verified.user.id),
            role,
        })
    }

    /// Probe the identity service's health endpoint.
    ///
    /// Used by readiness checks; no retry, a down service should be
    /// reported promptly.
    pub async fn health(&self) -> Result<(), IdentityError> {
        let endpoint = "GET /health";
        let url = format!("{}health", self.base_url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Upstream {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }
        Ok(())
    }

    /// Fetch a user's display profile.
    ///
    /// Calls `GET {base}/user/{id}` with the configured service bearer
    /// token. This data is advisory (names and emails for response
    /// decoration) — it is never an input to authorization.
    pub async fn get_user(&self, id: UserId) -> Result<UserProfile, IdentityError> {
        let endpoint = format!("GET /user/{}", id.as_uuid());
        let url = format!("{}user/{}", self.base_url, id.as_uuid());

        let resp = retry::retry_send(|| {
            let mut req = self.http.get(&url);
            if let Some(token) = &self.service_token {
                req = req.bearer_auth(token);
            }
            req.send()
        })
        .await
        .map_err(|e| IdentityError::Unavailable {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Upstream {
                endpoint,
                status,
                body,
            });
        }

        let user: types::UserResponse =
            resp.json().await.map_err(|e| IdentityError::Deserialization {
                endpoint,
                source: e,
            })?;

        Ok(user.user)
    }
}

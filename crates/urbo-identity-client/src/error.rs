//! Identity client error types.
//!
//! The variants deliberately separate "the credential is bad"
//! ([`IdentityError::InvalidToken`]) from "the service cannot answer"
//! ([`IdentityError::Unavailable`] / [`IdentityError::Upstream`]) so that
//! callers and retry logic can treat them differently.

use urbo_core::PrincipalError;

/// Errors from identity service calls.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The identity service answered and rejected the token (4xx).
    #[error("identity service rejected the token ({status}): {body}")]
    InvalidToken {
        /// HTTP status returned by the verify endpoint.
        status: u16,
        /// Response body, for logs only.
        body: String,
    },

    /// The token was accepted but the user record's role claims could not
    /// be consolidated into a known role.
    #[error("identity service returned an unusable principal: {0}")]
    InvalidPrincipal(#[from] PrincipalError),

    /// Transport-level failure: connection refused, DNS, timeout.
    #[error("identity service unreachable calling {endpoint}: {source}")]
    Unavailable {
        /// The endpoint being called.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },

    /// The identity service answered with an unexpected error status.
    #[error("identity service {endpoint} returned {status}: {body}")]
    Upstream {
        /// The endpoint being called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for logs only.
        body: String,
    },

    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// The endpoint being called.
        endpoint: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

//! Identity client configuration.
//!
//! Base URL and timeout for the identity service. Defaults suit local
//! development; override via environment variables or explicit construction.

use url::Url;

/// Configuration for connecting to the identity service.
///
/// Custom `Debug` implementation redacts the `service_token` field to
/// prevent credential leakage in log output.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity service.
    pub base_url: Url,
    /// Bearer token for service-to-service calls (`GET /user/{id}`).
    /// Token verification itself needs no credential.
    pub service_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field(
                "service_token",
                &self.service_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl IdentityConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `IDENTITY_SERVICE_URL` (default: `http://localhost:5001`)
    /// - `IDENTITY_SERVICE_TOKEN` (optional)
    /// - `IDENTITY_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("IDENTITY_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:5001".to_string());
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("IDENTITY_SERVICE_URL".into(), e.to_string()))?;

        Ok(Self {
            base_url,
            service_token: std::env::var("IDENTITY_SERVICE_TOKEN").ok(),
            timeout_secs: std::env::var("IDENTITY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        })
    }

    /// Create a configuration pointing at a local server (for testing).
    pub fn local(port: u16, service_token: Option<&str>) -> Self {
        // Parsing a literal localhost URL cannot fail for a valid port.
        let base_url = Url::parse(&format!("http://127.0.0.1:{port}"))
            .unwrap_or_else(|_| unreachable!("localhost URL with numeric port always parses"));
        Self {
            base_url,
            service_token: service_token.map(String::from),
            timeout_secs: 2,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL environment variable did not parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

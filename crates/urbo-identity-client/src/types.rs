//! Wire types matching the identity service's JSON shapes.
//!
//! The raw record carries BOTH `role` and `document_type` — the historical
//! inconsistency this crate consolidates in [`verify_token`]. Both fields
//! are optional with `#[serde(default)]` so records from older identity
//! service deployments still deserialize.
//!
//! [`verify_token`]: crate::IdentityClient::verify_token

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /verify-token`.
#[derive(Debug, Serialize)]
pub(crate) struct VerifyTokenRequest<'a> {
    pub token: &'a str,
}

/// Successful response of `POST /verify-token`.
#[derive(Debug, Deserialize)]
pub(crate) struct VerifyTokenResponse {
    pub user: RawUser,
}

/// The identity service's user record as returned by `/verify-token`.
///
/// Never exposed outside this crate's resolution path — callers receive a
/// consolidated `Principal`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    /// The user's id.
    pub id: Uuid,
    /// The `role` claim (`"user"`, `"individual"`, `"organization"`,
    /// `"admin"`); authoritative when recognized.
    #[serde(default)]
    pub role: Option<String>,
    /// The registration document kind (`"cpf"` / `"cnpj"`); fallback when
    /// `role` is missing or unrecognized.
    #[serde(default)]
    pub document_type: Option<String>,
}

/// Successful response of `GET /user/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub user: UserProfile,
}

/// A user's display profile, used only to decorate ticket responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's id.
    pub id: Uuid,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Registration document kind, when present.
    #[serde(default)]
    pub document_type: Option<String>,
    /// Raw role string, when present. Advisory only — authorization never
    /// reads it.
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_response_parses_full_record() {
        let json = r#"{
            "valid": true,
            "user": {
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "name": "Maria Silva",
                "email": "maria@example.com",
                "document_type": "cpf",
                "role": "user"
            }
        }"#;
        let parsed: VerifyTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.user.role.as_deref(), Some("user"));
        assert_eq!(parsed.user.document_type.as_deref(), Some("cpf"));
    }

    #[test]
    fn raw_user_tolerates_missing_claims() {
        let json = r#"{"id": "550e8400-e29b-41d4-a716-446655440000"}"#;
        let parsed: RawUser = serde_json::from_str(json).unwrap();
        assert!(parsed.role.is_none());
        assert!(parsed.document_type.is_none());
    }

    #[test]
    fn user_profile_roundtrip() {
        let json = r#"{"user": {"id": "550e8400-e29b-41d4-a716-446655440000", "name": "Prefeitura", "email": "org@example.com", "document_type": "cnpj", "role": "organization"}}"#;
        let parsed: UserResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.user.name.as_deref(), Some("Prefeitura"));
    }
}

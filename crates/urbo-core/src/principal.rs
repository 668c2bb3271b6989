//! # Principal Model & Role Consolidation
//!
//! A [`Principal`] is the verified identity of a caller for the lifetime of
//! one request: an opaque id plus a single closed [`Role`].
//!
//! The identity service's user records carry the role across two fields that
//! have drifted apart over time: a `role` string (`"user"`, `"organization"`,
//! `"admin"`) and a `document_type` field (`"cpf"` for natural persons,
//! `"cnpj"` for companies). [`Role::from_claims`] consolidates both into one
//! enum at resolution time; nothing downstream branches on the raw strings.
//!
//! Consolidation rule: `role` is authoritative; `document_type` is the
//! fallback when `role` is absent or unrecognized. A record where neither
//! resolves is an invalid principal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::UserId;

/// Roles in URBO, ordered by privilege level.
///
/// The `Ord` derivation respects variant declaration order:
/// `Individual < Organization < Admin`. This enables `>=` comparison for
/// minimum-role checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A person reporting issues. Can create tickets and leave feedback on
    /// their own resolved tickets.
    Individual,
    /// A company or public body that claims and resolves tickets.
    Organization,
    /// Oversees everything.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Organization => "organization",
            Self::Admin => "admin",
        }
    }

    /// Consolidate the identity service's raw claims into a role.
    ///
    /// The `role` claim is authoritative. `"user"` is the legacy spelling of
    /// `"individual"` and is accepted. When `role` is missing or carries an
    /// unknown value, `document_type` decides: `"cpf"` registers a natural
    /// person, `"cnpj"` a company.
    pub fn from_claims(
        role: Option<&str>,
        document_type: Option<&str>,
    ) -> Result<Self, PrincipalError> {
        match role.map(str::trim) {
            Some("user") | Some("individual") => return Ok(Self::Individual),
            Some("organization") => return Ok(Self::Organization),
            Some("admin") => return Ok(Self::Admin),
            _ => {}
        }
        match document_type.map(str::trim) {
            Some("cpf") => Ok(Self::Individual),
            Some("cnpj") => Ok(Self::Organization),
            _ => Err(PrincipalError::UnresolvableRole {
                role: role.map(String::from),
                document_type: document_type.map(String::from),
            }),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verified identity of a caller. Immutable for the lifetime of a
/// request; constructed only from a token the identity service accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The caller's user id as recorded by the identity service.
    pub id: UserId,
    /// The caller's consolidated role.
    pub role: Role,
}

impl Principal {
    /// Check if the principal has at least the given minimum role.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }
}

/// Errors in principal construction.
#[derive(Error, Debug)]
pub enum PrincipalError {
    /// Neither the `role` claim nor the `document_type` claim resolved to a
    /// known role.
    #[error("cannot resolve role from claims role={role:?} document_type={document_type:?}")]
    UnresolvableRole {
        /// The raw `role` claim, if present.
        role: Option<String>,
        /// The raw `document_type` claim, if present.
        document_type: Option<String>,
    },
}

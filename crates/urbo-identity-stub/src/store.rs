//! In-memory storage backend using DashMap.
//!
//! Users are keyed by id; opaque tokens map to user ids. Tokens are minted
//! at registration and never expire here — expiry is the real identity
//! service's concern, not the stub's.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user record as the identity service stores it.
///
/// Carries BOTH `role` and `document_type`, reproducing the historical
/// inconsistency the ticket service's resolver consolidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Inner storage holding all DashMaps.
struct Inner {
    users: DashMap<Uuid, StubUser>,
    tokens: DashMap<String, Uuid>,
}

/// Shared application state holding all in-memory stores.
///
/// Cheaply cloneable via `Arc` — all clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                users: DashMap::new(),
                tokens: DashMap::new(),
            }),
        }
    }

    pub fn users(&self) -> &DashMap<Uuid, StubUser> {
        &self.inner.users
    }

    pub fn tokens(&self) -> &DashMap<String, Uuid> {
        &self.inner.tokens
    }

    /// Insert a user and mint an opaque bearer token for them.
    pub fn register(&self, user: StubUser) -> String {
        let token = format!("tok-{}", Uuid::new_v4());
        self.inner.tokens.insert(token.clone(), user.id);
        self.inner.users.insert(user.id, user);
        token
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor.
//!
//! ## Architecture
//!
//! `AppState` holds only ticket-service-owned concerns:
//! - **Tickets** — the authoritative in-memory store with atomic
//!   read-validate-update (the conditional write that serializes claim
//!   races), optionally backed by Postgres write-through.
//! - **Identity client** — the only path to the identity service.
//! - **User-info cache** — advisory display data with TTL.
//!
//! User identity data is NOT stored here. It lives in the identity service
//! and is accessed via `urbo-identity-client`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use urbo_identity_client::IdentityClient;
use urbo_state::Ticket;

use crate::cache::UserInfoCache;

// ─── Generic In-Memory Store ─────────────────────────────────────────

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
/// `parking_lot::RwLock` is non-poisonable — a panicking writer does not
/// permanently corrupt the store.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure receives a `&mut T` and may inspect the current state,
    /// validate preconditions, mutate the record, and return `Ok(R)` or
    /// `Err(E)`. The entire operation runs under a single write lock,
    /// eliminating TOCTOU races between read and update — two requests
    /// racing to claim the same ticket serialize here, and exactly one
    /// sees the precondition hold.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    #[allow(dead_code)]
    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Application State ───────────────────────────────────────────────

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// TTL for cached user display info, in seconds.
    pub user_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            user_cache_ttl_secs: 300,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in the store, cache, and client.
/// The identity client and cache are dependency-injected at construction —
/// created once per process, torn down on shutdown.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Authoritative ticket store.
    pub tickets: Store<Ticket>,

    /// Client for the identity service (token verification, user lookup).
    pub identity: IdentityClient,

    /// Read-through cache of user display info. Advisory only — never an
    /// input to authorization.
    pub user_info: UserInfoCache,

    /// PostgreSQL connection pool for durable persistence. When `Some`,
    /// ticket mutations are written through; when `None`, the service is
    /// in-memory only.
    pub db_pool: Option<PgPool>,

    /// Application configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Create application state with default configuration and no database.
    pub fn new(identity: IdentityClient) -> Self {
        Self::with_config(AppConfig::default(), identity, None)
    }

    /// Create application state with the given configuration and optional
    /// database pool.
    pub fn with_config(
        config: AppConfig,
        identity: IdentityClient,
        db_pool: Option<PgPool>,
    ) -> Self {
        let user_info = UserInfoCache::new(identity.clone(), config.user_cache_ttl_secs);
        Self {
            tickets: Store::new(),
            identity,
            user_info,
            db_pool,
            config,
        }
    }

    /// Hydrate the in-memory ticket store from the database.
    ///
    /// Called once on startup when a database pool is available, so that
    /// read operations stay fast and synchronous afterwards.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let tickets = crate::db::tickets::load_all(pool)
            .await
            .map_err(|e| format!("failed to load tickets: {e}"))?;
        let count = tickets.len();
        for ticket in tickets {
            self.tickets.insert(ticket.id.0, ticket);
        }

        tracing::info!(tickets = count, "hydrated ticket store from database");
        Ok(())
    }
}

//! # User-Info Cache
//!
//! Read-through cache of user display attributes (name, email) used to
//! decorate ticket responses. Advisory data only: authorization decisions
//! never consult it, and callers must treat the values as eventually stale.
//!
//! Entries expire after a TTL and can be dropped explicitly via
//! [`UserInfoCache::invalidate`]. Lookup failures fall back to the stale
//! entry when one exists, otherwise to a deterministic placeholder — and
//! failures are never cached, so a recovered identity service is observed
//! on the next request.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use urbo_core::UserId;
use urbo_identity_client::IdentityClient;

/// A cached display record for one user.
#[derive(Debug, Clone)]
pub struct CachedUserInfo {
    /// The user this record describes.
    pub id: UserId,
    /// Display name; `"unknown user"` when the identity service could not
    /// provide one.
    pub display_name: String,
    /// Email address; empty when unknown.
    pub email: String,
    /// When this record was fetched from the identity service.
    pub fetched_at: DateTime<Utc>,
}

impl CachedUserInfo {
    /// The deterministic placeholder served when no data is available.
    fn fallback(id: UserId) -> Self {
        Self {
            id,
            display_name: "unknown user".to_string(),
            email: String::new(),
            fetched_at: Utc::now(),
        }
    }
}

/// Shared, TTL-bounded cache of user display info.
///
/// Cheaply cloneable via `Arc` — all clones share the same entries.
#[derive(Debug, Clone)]
pub struct UserInfoCache {
    client: IdentityClient,
    entries: Arc<DashMap<UserId, CachedUserInfo>>,
    ttl: Duration,
}

impl UserInfoCache {
    /// Create a cache backed by the given identity client.
    pub fn new(client: IdentityClient, ttl_secs: u64) -> Self {
        Self {
            client,
            entries: Arc::new(DashMap::new()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Fetch display info for a user, from cache when fresh.
    ///
    /// Infallible: this data is decoration, so upstream failures
    /// degrade to the stale entry (when present) or the `"unknown user"`
    /// placeholder rather than failing the request.
    pub async fn get(&self, id: UserId) -> CachedUserInfo {
        let now = Utc::now();

        // Clone out of the map so no shard guard is held across the await.
        let cached = self.entries.get(&id).map(|e| e.value().clone());
        if let Some(entry) = &cached {
            if now - entry.fetched_at < self.ttl {
                return entry.clone();
            }
        }

        match self.client.get_user(id).await {
            Ok(profile) => {
                let entry = CachedUserInfo {
                    id,
                    display_name: profile
                        .name
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or_else(|| "unknown user".to_string()),
                    email: profile.email.unwrap_or_default(),
                    fetched_at: now,
                };
                self.entries.insert(id, entry.clone());
                entry
            }
            Err(e) => {
                tracing::warn!(user = %id, error = %e, "user info lookup failed");
                // Serve stale over nothing; never cache the failure.
                cached.unwrap_or_else(|| CachedUserInfo::fallback(id))
            }
        }
    }

    /// Drop the cached entry for a user, forcing a refetch on next lookup.
    pub fn invalidate(&self, id: &UserId) {
        self.entries.remove(id);
    }

    /// Number of cached entries.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn seed(&self, entry: CachedUserInfo) {
        self.entries.insert(entry.id, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urbo_identity_client::IdentityConfig;

    /// A client pointing at a closed port — every lookup fails fast.
    fn unreachable_cache(ttl_secs: u64) -> UserInfoCache {
        let client = IdentityClient::new(IdentityConfig::local(1, None)).unwrap();
        UserInfoCache::new(client, ttl_secs)
    }

    fn entry(id: UserId, name: &str, fetched_at: DateTime<Utc>) -> CachedUserInfo {
        CachedUserInfo {
            id,
            display_name: name.to_string(),
            email: "user@example.com".to_string(),
            fetched_at,
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_a_lookup() {
        let cache = unreachable_cache(300);
        let id = UserId::new();
        cache.seed(entry(id, "Maria Silva", Utc::now()));

        // The backing client cannot answer; a hit proves no lookup happened.
        let info = cache.get(id).await;
        assert_eq!(info.display_name, "Maria Silva");
    }

    #[tokio::test]
    async fn expired_entry_is_served_stale_when_refresh_fails() {
        let cache = unreachable_cache(60);
        let id = UserId::new();
        cache.seed(entry(id, "Maria Silva", Utc::now() - Duration::seconds(3600)));

        let info = cache.get(id).await;
        assert_eq!(info.display_name, "Maria Silva", "stale beats placeholder");
    }

    #[tokio::test]
    async fn unknown_user_falls_back_to_placeholder() {
        let cache = unreachable_cache(60);
        let info = cache.get(UserId::new()).await;
        assert_eq!(info.display_name, "unknown user");
        assert_eq!(info.email, "");
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = unreachable_cache(60);
        let id = UserId::new();
        let _ = cache.get(id).await;
        assert_eq!(cache.len(), 0, "fallback must not be written to the cache");
    }

    #[tokio::test]
    async fn invalidate_removes_the_entry() {
        let cache = unreachable_cache(300);
        let id = UserId::new();
        cache.seed(entry(id, "Maria Silva", Utc::now()));
        cache.invalidate(&id);

        let info = cache.get(id).await;
        assert_eq!(info.display_name, "unknown user");
    }
}

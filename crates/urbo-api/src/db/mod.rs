//! # Database Persistence Layer
//!
//! Optional Postgres persistence for ticket records via SQLx.
//!
//! ## Architecture
//!
//! When `DATABASE_URL` is set, every ticket mutation is written through to
//! PostgreSQL and the in-memory store is hydrated from it on startup. When
//! absent, the service operates in-memory only (suitable for development
//! and testing).
//!
//! Lifecycle transitions use **conditional updates** keyed on the current
//! status column (`UPDATE ... WHERE id = $1 AND status = $2`) so the
//! database enforces the same compare-and-swap the in-memory store does.
//!
//! User identity data is never persisted here — it lives in the identity
//! service and is accessed via `urbo-identity-client`.

pub mod tickets;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 Tickets will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}

//! Ticket persistence operations.
//!
//! All functions operate on the `tickets` table. Lifecycle constraints are
//! enforced at the application layer; the conditional update functions key
//! their `WHERE` clauses on the status column so the database rejects
//! writes whose precondition no longer holds.
//!
//! Write paths serialize strictly and surface failures; the read path is
//! tolerant (unknown status defaults to OPEN with an ERROR log) so new
//! code can still load rows written by older deployments.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use urbo_core::{TicketId, UserId};
use urbo_state::{Ticket, TicketStatus, TransitionRecord};

/// Serialize a transition log for persistence.
///
/// Strict: a log that cannot be serialized fails the write rather than
/// persisting a truncated audit trail.
fn serialize_transition_log(log: &[TransitionRecord]) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(log).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize ticket transition_log");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Insert a new ticket record.
pub async fn insert(pool: &PgPool, ticket: &Ticket) -> Result<(), sqlx::Error> {
    let transition_log = serialize_transition_log(&ticket.transition_log)?;

    sqlx::query(
        "INSERT INTO tickets (id, title, description, owner_id, assigned_company_id, image_ref, \
         address, status, feedback, transition_log, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(ticket.id.0)
    .bind(&ticket.title)
    .bind(&ticket.description)
    .bind(ticket.owner_id.0)
    .bind(ticket.assigned_company_id.map(|c| c.0))
    .bind(&ticket.image_ref)
    .bind(&ticket.address)
    .bind(ticket.status.as_str())
    .bind(&ticket.feedback)
    .bind(&transition_log)
    .bind(ticket.created_at)
    .bind(ticket.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Conditionally claim a ticket: the row must still be OPEN.
///
/// This is the database half of the assign compare-and-swap. Returns
/// `Ok(None)` when no pool is configured, `Ok(Some(false))` when the row
/// did not match (the in-memory state and the database have diverged).
pub async fn assign_open(
    pool: Option<&PgPool>,
    ticket: &Ticket,
) -> Result<Option<bool>, sqlx::Error> {
    let Some(pool) = pool else { return Ok(None) };
    let transition_log = serialize_transition_log(&ticket.transition_log)?;

    let result = sqlx::query(
        "UPDATE tickets SET status = $2, assigned_company_id = $3, transition_log = $4, \
         updated_at = $5 WHERE id = $1 AND status = 'OPEN'",
    )
    .bind(ticket.id.0)
    .bind(ticket.status.as_str())
    .bind(ticket.assigned_company_id.map(|c| c.0))
    .bind(&transition_log)
    .bind(ticket.updated_at)
    .execute(pool)
    .await?;

    Ok(Some(result.rows_affected() > 0))
}

/// Conditionally resolve a ticket: the row must still be IN_PROGRESS and
/// assigned to the completing organization.
pub async fn complete_in_progress(
    pool: Option<&PgPool>,
    ticket: &Ticket,
) -> Result<Option<bool>, sqlx::Error> {
    let Some(pool) = pool else { return Ok(None) };
    let transition_log = serialize_transition_log(&ticket.transition_log)?;

    let result = sqlx::query(
        "UPDATE tickets SET status = $2, transition_log = $3, updated_at = $4 \
         WHERE id = $1 AND status = 'IN_PROGRESS' AND assigned_company_id = $5",
    )
    .bind(ticket.id.0)
    .bind(ticket.status.as_str())
    .bind(&transition_log)
    .bind(ticket.updated_at)
    .bind(ticket.assigned_company_id.map(|c| c.0))
    .execute(pool)
    .await?;

    Ok(Some(result.rows_affected() > 0))
}

/// Conditionally store feedback: the row must be RESOLVED and owned by the
/// feedback author.
pub async fn set_feedback(
    pool: Option<&PgPool>,
    ticket: &Ticket,
) -> Result<Option<bool>, sqlx::Error> {
    let Some(pool) = pool else { return Ok(None) };

    let result = sqlx::query(
        "UPDATE tickets SET feedback = $2, updated_at = $3 \
         WHERE id = $1 AND status = 'RESOLVED' AND owner_id = $4",
    )
    .bind(ticket.id.0)
    .bind(&ticket.feedback)
    .bind(ticket.updated_at)
    .bind(ticket.owner_id.0)
    .execute(pool)
    .await?;

    Ok(Some(result.rows_affected() > 0))
}

/// Update descriptive fields (title, description, address, image_ref).
pub async fn update_fields(pool: &PgPool, ticket: &Ticket) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE tickets SET title = $2, description = $3, address = $4, image_ref = $5, \
         updated_at = $6 WHERE id = $1",
    )
    .bind(ticket.id.0)
    .bind(&ticket.title)
    .bind(&ticket.description)
    .bind(&ticket.address)
    .bind(&ticket.image_ref)
    .bind(ticket.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist a legacy status override. Unconditional on status — the whole
/// point of the escape hatch is that the transition table does not apply.
pub async fn override_row(pool: &PgPool, ticket: &Ticket) -> Result<(), sqlx::Error> {
    let transition_log = serialize_transition_log(&ticket.transition_log)?;

    sqlx::query(
        "UPDATE tickets SET status = $2, transition_log = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(ticket.id.0)
    .bind(ticket.status.as_str())
    .bind(&transition_log)
    .bind(ticket.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a ticket row.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Load all tickets, oldest first, for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Ticket>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TicketRow>(
        "SELECT id, title, description, owner_id, assigned_company_id, image_ref, address, \
         status, feedback, transition_log, created_at, updated_at
         FROM tickets ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TicketRow::into_ticket).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    title: String,
    description: String,
    owner_id: Uuid,
    assigned_company_id: Option<Uuid>,
    image_ref: Option<String>,
    address: String,
    status: String,
    feedback: Option<String>,
    transition_log: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TicketRow {
    fn into_ticket(self) -> Ticket {
        // Read path is tolerant: an unknown status string defaults to OPEN
        // but logs at ERROR, because it may indicate data written by a
        // deployment this code does not know about.
        let status: TicketStatus =
            serde_json::from_value(serde_json::Value::String(self.status.clone()))
                .unwrap_or_else(|e| {
                    tracing::error!(
                        id = %self.id,
                        status = %self.status,
                        error = %e,
                        "unknown ticket status in database — defaulting to OPEN; investigate"
                    );
                    TicketStatus::Open
                });

        let transition_log: Vec<TransitionRecord> =
            serde_json::from_value(self.transition_log).unwrap_or_else(|e| {
                tracing::error!(
                    id = %self.id,
                    error = %e,
                    "failed to deserialize ticket transition_log — defaulting to empty"
                );
                Vec::new()
            });

        Ticket {
            id: TicketId(self.id),
            title: self.title,
            description: self.description,
            owner_id: UserId(self.owner_id),
            assigned_company_id: self.assigned_company_id.map(UserId),
            image_ref: self.image_ref,
            address: self.address,
            status,
            feedback: self.feedback,
            transition_log,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

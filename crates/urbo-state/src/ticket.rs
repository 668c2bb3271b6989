//! # Ticket Record & Lifecycle State Machine
//!
//! Runtime-validated transitions over the three ticket states. Every status
//! change appends a [`TransitionRecord`], creating an audit trail of who
//! moved the ticket and when.
//!
//! The canonical machine is `Open → InProgress → Resolved`. The legacy
//! [`Ticket::override_status`] method sits outside it and can produce
//! records the canonical machine never would (see its docs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use urbo_core::{TicketId, UserId};

// ─── Status ──────────────────────────────────────────────────────────

/// The lifecycle state of a ticket.
///
/// Serialized in `SCREAMING_SNAKE_CASE` to keep the wire values closed —
/// free-form status strings are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// Reported and waiting for an organization to claim it.
    Open,
    /// Claimed by an organization and being worked on.
    InProgress,
    /// Work finished; the owner may leave feedback.
    Resolved,
}

impl TicketStatus {
    /// Returns the canonical state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
        }
    }

    /// The states reachable from this one through canonical actions.
    pub fn valid_transitions(&self) -> &'static [TicketStatus] {
        match self {
            Self::Open => &[TicketStatus::InProgress],
            Self::InProgress => &[TicketStatus::Resolved],
            Self::Resolved => &[],
        }
    }

    /// Whether this state is terminal for the canonical machine.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of a single status change in a ticket's life.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Status before the change.
    pub from_status: TicketStatus,
    /// Status after the change.
    pub to_status: TicketStatus,
    /// The principal that performed the change.
    pub actor_id: UserId,
    /// When the change occurred (UTC).
    pub timestamp: DateTime<Utc>,
    /// Human-readable note; override transitions always carry one.
    pub reason: Option<String>,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Lifecycle precondition violations.
///
/// These are always local and recoverable; the message carries the current
/// status and the attempted action so the client can react.
#[derive(Error, Debug)]
pub enum TicketError {
    /// The ticket's current status does not permit the attempted action.
    #[error("cannot {action} ticket {ticket}: status is {current}, requires {required}")]
    StateConflict {
        /// The ticket in question.
        ticket: TicketId,
        /// What was attempted ("assign", "complete", "feedback").
        action: &'static str,
        /// The status the ticket is in.
        current: TicketStatus,
        /// The status the action requires.
        required: TicketStatus,
    },

    /// Completion was attempted on a ticket with no assigned organization.
    ///
    /// Canonically unreachable (`InProgress` implies an assignee); only a
    /// legacy status override can produce this shape.
    #[error("cannot complete ticket {ticket}: no assigned organization")]
    NotAssigned {
        /// The ticket in question.
        ticket: TicketId,
    },
}

// ─── Ticket ──────────────────────────────────────────────────────────

/// A reported issue and its lifecycle state.
///
/// Invariants maintained by the canonical transition methods:
/// - `assigned_company_id` is `None` iff `status == Open`, and once set it
///   never changes.
/// - `feedback` is only set while `Resolved`.
/// - `owner_id` never changes after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket identifier.
    pub id: TicketId,
    /// Short summary of the issue.
    pub title: String,
    /// Full description.
    pub description: String,
    /// The individual that reported the issue. Immutable.
    pub owner_id: UserId,
    /// The organization working on the issue, once one has claimed it.
    pub assigned_company_id: Option<UserId>,
    /// Opaque reference to an uploaded image, when one was attached.
    pub image_ref: Option<String>,
    /// Street address or free-form location of the issue.
    pub address: String,
    /// Current lifecycle state.
    pub status: TicketStatus,
    /// Owner feedback, set after resolution.
    pub feedback: Option<String>,
    /// Audit trail of status changes.
    pub transition_log: Vec<TransitionRecord>,
    /// When the ticket was created.
    pub created_at: DateTime<Utc>,
    /// When the ticket was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a new ticket in `Open` status.
    ///
    /// Creation is not recorded as a transition — the first log entry will
    /// be the `assign` that moves it to `InProgress`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TicketId,
        title: String,
        description: String,
        address: String,
        image_ref: Option<String>,
        owner_id: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            owner_id,
            assigned_company_id: None,
            image_ref,
            address,
            status: TicketStatus::Open,
            feedback: None,
            transition_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Claim the ticket for an organization (`Open → InProgress`).
    ///
    /// Sets `assigned_company_id` to the claiming organization. Fails with
    /// [`TicketError::StateConflict`] when the ticket is not `Open` — this
    /// is the losing side of a claim race.
    pub fn assign(&mut self, company: UserId, now: DateTime<Utc>) -> Result<(), TicketError> {
        if self.status != TicketStatus::Open {
            return Err(TicketError::StateConflict {
                ticket: self.id,
                action: "assign",
                current: self.status,
                required: TicketStatus::Open,
            });
        }
        self.assigned_company_id = Some(company);
        self.record_transition(TicketStatus::InProgress, company, Some("claimed".into()), now);
        Ok(())
    }

    /// Mark the work finished (`InProgress → Resolved`).
    ///
    /// `company` must be the assigned organization; the caller's policy
    /// check rejects mismatches before this runs, so a mismatch here means
    /// the record was mutated through the legacy override path.
    pub fn complete(&mut self, company: UserId, now: DateTime<Utc>) -> Result<(), TicketError> {
        if self.status != TicketStatus::InProgress {
            return Err(TicketError::StateConflict {
                ticket: self.id,
                action: "complete",
                current: self.status,
                required: TicketStatus::InProgress,
            });
        }
        match self.assigned_company_id {
            Some(assigned) if assigned == company => {}
            _ => return Err(TicketError::NotAssigned { ticket: self.id }),
        }
        self.record_transition(TicketStatus::Resolved, company, Some("resolved".into()), now);
        Ok(())
    }

    /// Store the owner's feedback on a resolved ticket.
    ///
    /// Ownership is the policy layer's concern. Not a status transition —
    /// the status stays `Resolved` and no log entry is appended; only the
    /// field and `updated_at` change.
    pub fn leave_feedback(&mut self, text: String, now: DateTime<Utc>) -> Result<(), TicketError> {
        if self.status != TicketStatus::Resolved {
            return Err(TicketError::StateConflict {
                ticket: self.id,
                action: "feedback",
                current: self.status,
                required: TicketStatus::Resolved,
            });
        }
        self.feedback = Some(text);
        self.updated_at = now;
        Ok(())
    }

    /// Legacy escape hatch: set the status directly, bypassing the
    /// transition table.
    ///
    /// **Deprecated behavior, kept for compatibility.** This can skip
    /// `InProgress`, reopen a `Resolved` ticket, and leave the record in
    /// shapes the canonical machine never produces (e.g. `Open` with an
    /// assignee, since the assignee is deliberately left untouched). It is
    /// not part of the lifecycle machine; callers must surface its use as
    /// deprecated.
    pub fn override_status(
        &mut self,
        status: TicketStatus,
        actor: UserId,
        now: DateTime<Utc>,
    ) {
        let from = self.status;
        self.record_transition_from(from, status, actor, Some("legacy status override".into()), now);
    }

    fn record_transition(
        &mut self,
        to: TicketStatus,
        actor: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) {
        let from = self.status;
        self.record_transition_from(from, to, actor, reason, now);
    }

    fn record_transition_from(
        &mut self,
        from: TicketStatus,
        to: TicketStatus,
        actor: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.transition_log.push(TransitionRecord {
            from_status: from,
            to_status: to,
            actor_id: actor,
            timestamp: now,
            reason,
        });
        self.status = to;
        self.updated_at = now;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

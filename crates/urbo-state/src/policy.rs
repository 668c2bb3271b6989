//! # Authorization Policy
//!
//! A pure decision layer: given the verified [`Principal`], the targeted
//! [`Ticket`] (when the action addresses one), and the [`TicketAction`],
//! decide allow or deny. No I/O, no clock, no cache — display data in
//! particular is never consulted for access decisions.
//!
//! Role and ownership mismatches are `Forbidden`-class ([`PolicyError`]);
//! lifecycle preconditions are the state machine's concern and are checked
//! after the policy passes.

use thiserror::Error;

use urbo_core::{Principal, Role, TicketId};

use crate::ticket::{Ticket, TicketStatus};

/// The actions a caller can attempt against the ticket surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    /// Report a new issue.
    Create,
    /// List tickets (role-filtered).
    List,
    /// View a single ticket.
    View,
    /// Claim an open ticket.
    Assign,
    /// Finish work on a claimed ticket.
    Complete,
    /// Leave feedback on a resolved ticket.
    Feedback,
    /// Edit descriptive fields.
    Update,
    /// Hard-delete a ticket (peripheral admin operation).
    Delete,
    /// Aggregate counts.
    Stats,
    /// Legacy direct status set, bypassing the transition table.
    OverrideStatus,
}

impl TicketAction {
    /// Returns the action name used in log and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::List => "list",
            Self::View => "view",
            Self::Assign => "assign",
            Self::Complete => "complete",
            Self::Feedback => "feedback",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Stats => "stats",
            Self::OverrideStatus => "override status",
        }
    }
}

impl std::fmt::Display for TicketAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization denials. All map to 403 at the API layer.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// The caller's role may never perform this action.
    #[error("role '{role}' may not {action}")]
    RoleNotAllowed {
        /// The caller's role.
        role: Role,
        /// The denied action.
        action: TicketAction,
    },

    /// The caller is not the ticket's owner.
    #[error("caller is not the owner of {ticket}")]
    NotOwner {
        /// The targeted ticket.
        ticket: TicketId,
    },

    /// The ticket is assigned to a different organization.
    #[error("{ticket} is assigned to a different organization")]
    NotAssignee {
        /// The targeted ticket.
        ticket: TicketId,
    },

    /// The ticket is outside the caller's visibility.
    #[error("{ticket} is not visible to the caller")]
    NotVisible {
        /// The targeted ticket.
        ticket: TicketId,
    },
}

/// Whether the principal may see the ticket at all.
///
/// - Admin: always.
/// - Individual: only their own tickets.
/// - Organization: open tickets (the claimable pool) and tickets assigned
///   to them.
///
/// Shared between `view` authorization and `list` filtering so the two can
/// never disagree.
pub fn can_view(principal: &Principal, ticket: &Ticket) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::Individual => ticket.owner_id == principal.id,
        Role::Organization => {
            ticket.status == TicketStatus::Open
                || ticket.assigned_company_id == Some(principal.id)
        }
    }
}

/// Decide whether `principal` may attempt `action` against `ticket`.
///
/// `ticket` is `None` exactly for the actions that do not address an
/// existing record (`Create`, `List`, `Stats`). Lifecycle preconditions
/// (e.g. "assign requires Open") are NOT checked here — they belong to the
/// state machine and surface as conflicts, not denials.
pub fn authorize(
    principal: &Principal,
    ticket: Option<&Ticket>,
    action: TicketAction,
) -> Result<(), PolicyError> {
    let deny_role = || PolicyError::RoleNotAllowed {
        role: principal.role,
        action,
    };

    match action {
        TicketAction::Create => {
            if principal.role != Role::Individual {
                return Err(deny_role());
            }
        }
        TicketAction::List => {}
        TicketAction::Stats => {
            if !principal.has_role(Role::Organization) {
                return Err(deny_role());
            }
        }
        TicketAction::View => {
            if let Some(ticket) = ticket {
                if !can_view(principal, ticket) {
                    return Err(PolicyError::NotVisible { ticket: ticket.id });
                }
            }
        }
        TicketAction::Assign => {
            if principal.role != Role::Organization {
                return Err(deny_role());
            }
        }
        TicketAction::Complete => {
            if principal.role != Role::Organization {
                return Err(deny_role());
            }
            if let Some(ticket) = ticket {
                if let Some(assigned) = ticket.assigned_company_id {
                    if assigned != principal.id {
                        return Err(PolicyError::NotAssignee { ticket: ticket.id });
                    }
                }
            }
        }
        TicketAction::Feedback => {
            if principal.role != Role::Individual {
                return Err(deny_role());
            }
            if let Some(ticket) = ticket {
                if ticket.owner_id != principal.id {
                    return Err(PolicyError::NotOwner { ticket: ticket.id });
                }
            }
        }
        TicketAction::Update => {
            if principal.role == Role::Admin {
                return Ok(());
            }
            if principal.role != Role::Individual {
                return Err(deny_role());
            }
            if let Some(ticket) = ticket {
                if ticket.owner_id != principal.id {
                    return Err(PolicyError::NotOwner { ticket: ticket.id });
                }
            }
        }
        TicketAction::Delete => {
            if principal.role != Role::Admin {
                return Err(deny_role());
            }
        }
        TicketAction::OverrideStatus => {
            if !principal.has_role(Role::Organization) {
                return Err(deny_role());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use urbo_core::UserId;

    fn principal(role: Role) -> Principal {
        Principal {
            id: UserId::new(),
            role,
        }
    }

    fn ticket_owned_by(owner: UserId) -> Ticket {
        Ticket::new(
            urbo_core::TicketId::new(),
            "Broken lamp".into(),
            "Street lamp out for a week".into(),
            "Elm St 12".into(),
            None,
            owner,
            Utc::now(),
        )
    }

    // ── create ───────────────────────────────────────────────────────

    #[test]
    fn only_individuals_create() {
        assert!(authorize(&principal(Role::Individual), None, TicketAction::Create).is_ok());
        assert!(authorize(&principal(Role::Organization), None, TicketAction::Create).is_err());
        assert!(authorize(&principal(Role::Admin), None, TicketAction::Create).is_err());
    }

    // ── view ─────────────────────────────────────────────────────────

    #[test]
    fn individual_views_only_own_tickets() {
        let me = principal(Role::Individual);
        let mine = ticket_owned_by(me.id);
        let theirs = ticket_owned_by(UserId::new());

        assert!(authorize(&me, Some(&mine), TicketAction::View).is_ok());
        let err = authorize(&me, Some(&theirs), TicketAction::View).unwrap_err();
        assert!(matches!(err, PolicyError::NotVisible { .. }));
    }

    #[test]
    fn organization_views_open_or_assigned() {
        let org = principal(Role::Organization);
        let open = ticket_owned_by(UserId::new());
        assert!(authorize(&org, Some(&open), TicketAction::View).is_ok());

        let mut assigned_to_me = ticket_owned_by(UserId::new());
        assigned_to_me.assign(org.id, Utc::now()).unwrap();
        assert!(authorize(&org, Some(&assigned_to_me), TicketAction::View).is_ok());

        let mut assigned_elsewhere = ticket_owned_by(UserId::new());
        assigned_elsewhere.assign(UserId::new(), Utc::now()).unwrap();
        assert!(authorize(&org, Some(&assigned_elsewhere), TicketAction::View).is_err());
    }

    #[test]
    fn admin_views_everything() {
        let admin = principal(Role::Admin);
        let mut t = ticket_owned_by(UserId::new());
        t.assign(UserId::new(), Utc::now()).unwrap();
        assert!(authorize(&admin, Some(&t), TicketAction::View).is_ok());
    }

    // ── assign / complete ────────────────────────────────────────────

    #[test]
    fn only_organizations_assign() {
        assert!(authorize(&principal(Role::Organization), None, TicketAction::Assign).is_ok());
        assert!(authorize(&principal(Role::Individual), None, TicketAction::Assign).is_err());
        assert!(authorize(&principal(Role::Admin), None, TicketAction::Assign).is_err());
    }

    #[test]
    fn complete_requires_being_the_assignee() {
        let org = principal(Role::Organization);
        let mut t = ticket_owned_by(UserId::new());
        t.assign(org.id, Utc::now()).unwrap();
        assert!(authorize(&org, Some(&t), TicketAction::Complete).is_ok());

        let other_org = principal(Role::Organization);
        let err = authorize(&other_org, Some(&t), TicketAction::Complete).unwrap_err();
        assert!(matches!(err, PolicyError::NotAssignee { .. }));
    }

    #[test]
    fn complete_on_unassigned_ticket_passes_policy() {
        // The state machine rejects this as a conflict; the policy has no
        // ownership to check yet.
        let org = principal(Role::Organization);
        let t = ticket_owned_by(UserId::new());
        assert!(authorize(&org, Some(&t), TicketAction::Complete).is_ok());
    }

    // ── feedback ─────────────────────────────────────────────────────

    #[test]
    fn feedback_is_owner_only() {
        let me = principal(Role::Individual);
        let mine = ticket_owned_by(me.id);
        assert!(authorize(&me, Some(&mine), TicketAction::Feedback).is_ok());

        let theirs = ticket_owned_by(UserId::new());
        let err = authorize(&me, Some(&theirs), TicketAction::Feedback).unwrap_err();
        assert!(matches!(err, PolicyError::NotOwner { .. }));

        let org = principal(Role::Organization);
        assert!(authorize(&org, Some(&mine), TicketAction::Feedback).is_err());
    }

    // ── update / delete / stats / override ───────────────────────────

    #[test]
    fn update_is_owner_or_admin() {
        let me = principal(Role::Individual);
        let mine = ticket_owned_by(me.id);
        let theirs = ticket_owned_by(UserId::new());
        assert!(authorize(&me, Some(&mine), TicketAction::Update).is_ok());
        assert!(authorize(&me, Some(&theirs), TicketAction::Update).is_err());
        assert!(authorize(&principal(Role::Admin), Some(&theirs), TicketAction::Update).is_ok());
        assert!(
            authorize(&principal(Role::Organization), Some(&theirs), TicketAction::Update)
                .is_err()
        );
    }

    #[test]
    fn delete_is_admin_only() {
        let t = ticket_owned_by(UserId::new());
        assert!(authorize(&principal(Role::Admin), Some(&t), TicketAction::Delete).is_ok());
        assert!(authorize(&principal(Role::Individual), Some(&t), TicketAction::Delete).is_err());
        assert!(
            authorize(&principal(Role::Organization), Some(&t), TicketAction::Delete).is_err()
        );
    }

    #[test]
    fn stats_and_override_need_at_least_organization() {
        for action in [TicketAction::Stats, TicketAction::OverrideStatus] {
            assert!(authorize(&principal(Role::Organization), None, action).is_ok());
            assert!(authorize(&principal(Role::Admin), None, action).is_ok());
            assert!(authorize(&principal(Role::Individual), None, action).is_err());
        }
    }

    #[test]
    fn denial_messages_name_role_and_action() {
        let err = authorize(&principal(Role::Individual), None, TicketAction::Assign)
            .unwrap_err()
            .to_string();
        assert!(err.contains("individual"));
        assert!(err.contains("assign"));
    }
}

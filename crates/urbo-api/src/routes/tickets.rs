//! # Ticket Operations API
//!
//! The orchestration layer for every ticket action. Each handler runs the
//! same pipeline and short-circuits at the first failing step:
//!
//! 1. principal already resolved by the auth middleware ([`Caller`])
//! 2. load the ticket when the action targets an id (404 on miss)
//! 3. authorization policy (403 on role/ownership mismatch)
//! 4. lifecycle transition, applied atomically via [`Store::try_update`]
//!    (409 on precondition violation — losing a claim race lands here)
//! 5. write-through persistence when Postgres is configured
//! 6. response shaping, with user display info from the cache on
//!    single-ticket views
//!
//! No in-process lock is held across a network call: the store lock is
//! scoped to the synchronous transition closure, and cache lookups happen
//! after it is released.
//!
//! [`Store::try_update`]: crate::state::Store::try_update

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use urbo_core::TicketId;
use urbo_state::{authorize, can_view, Ticket, TicketAction, TicketStatus, TransitionRecord};

use crate::auth::Caller;
use crate::cache::CachedUserInfo;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Build the tickets router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route("/tickets/stats", get(ticket_stats))
        .route(
            "/tickets/:id",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/tickets/:id/assign", patch(assign_ticket))
        .route("/tickets/:id/complete", patch(complete_ticket))
        .route("/tickets/:id/feedback", patch(feedback_ticket))
        .route("/tickets/:id/status", patch(override_status))
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Serialized ticket, shared by list and detail responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketBody {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub owner_id: Uuid,
    pub assigned_company_id: Option<Uuid>,
    pub image_ref: Option<String>,
    pub address: String,
    /// Lifecycle status: OPEN, IN_PROGRESS, or RESOLVED.
    #[schema(value_type = String)]
    pub status: TicketStatus,
    pub feedback: Option<String>,
    /// Audit trail of status changes.
    #[schema(value_type = Vec<Object>)]
    pub transition_log: Vec<TransitionRecord>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Ticket> for TicketBody {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id.0,
            title: t.title,
            description: t.description,
            owner_id: t.owner_id.0,
            assigned_company_id: t.assigned_company_id.map(|c| c.0),
            image_ref: t.image_ref,
            address: t.address,
            status: t.status,
            feedback: t.feedback,
            transition_log: t.transition_log,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Display info attached to single-ticket views. Advisory and possibly
/// stale — served from the user-info cache.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfoBody {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<CachedUserInfo> for UserInfoBody {
    fn from(info: CachedUserInfo) -> Self {
        Self {
            id: info.id.0,
            name: info.display_name,
            email: info.email,
        }
    }
}

/// Request to report a new issue.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub address: String,
    /// Opaque reference to an uploaded image (upload storage is external).
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl Validate for CreateTicketRequest {
    fn validate(&self) -> Result<(), String> {
        validate_descriptive_fields(&self.title, &self.description, &self.address)?;
        validate_image_ref(self.image_ref.as_deref())
    }
}

/// Response to ticket creation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTicketResponse {
    pub id: Uuid,
}

/// Filters for ticket listing. Role-based visibility applies on top.
#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct ListTicketsParams {
    /// Filter by status name (OPEN, IN_PROGRESS, RESOLVED).
    pub status: Option<String>,
    /// Case-insensitive substring match on the address.
    pub location: Option<String>,
}

/// List response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketBody>,
}

/// Single-ticket view with display decoration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketDetailResponse {
    pub ticket: TicketBody,
    /// The reporting individual's display info.
    pub owner: UserInfoBody,
    /// The assigned organization's display info, once assigned.
    pub assigned_company: Option<UserInfoBody>,
}

/// Request to edit a ticket's descriptive fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTicketRequest {
    pub title: String,
    pub description: String,
    pub address: String,
    /// When present, replaces the stored image reference; when absent, the
    /// stored reference is kept.
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl Validate for UpdateTicketRequest {
    fn validate(&self) -> Result<(), String> {
        validate_descriptive_fields(&self.title, &self.description, &self.address)?;
        validate_image_ref(self.image_ref.as_deref())
    }
}

/// Request to leave feedback on a resolved ticket.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    pub feedback: String,
}

impl Validate for FeedbackRequest {
    fn validate(&self) -> Result<(), String> {
        if self.feedback.trim().is_empty() {
            return Err("feedback must not be empty".to_string());
        }
        if self.feedback.len() > 2000 {
            return Err("feedback must not exceed 2000 characters".to_string());
        }
        Ok(())
    }
}

/// Request body of the legacy direct status set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OverrideStatusRequest {
    /// Target status name (OPEN, IN_PROGRESS, RESOLVED).
    pub status: String,
}

impl Validate for OverrideStatusRequest {
    fn validate(&self) -> Result<(), String> {
        if self.status.trim().is_empty() {
            return Err("status must not be empty".to_string());
        }
        Ok(())
    }
}

/// Response of the legacy direct status set.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OverrideStatusResponse {
    pub ticket: TicketBody,
    /// Always true — this endpoint bypasses the lifecycle machine and is
    /// kept for compatibility only.
    pub deprecated: bool,
}

/// Response to ticket deletion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteTicketResponse {
    pub id: Uuid,
}

/// Per-status count.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Aggregate ticket statistics.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketStatsResponse {
    pub total: usize,
    pub recent_7_days: usize,
    pub by_status: Vec<StatusCount>,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_descriptive_fields(
    title: &str,
    description: &str,
    address: &str,
) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("title must not be empty".to_string());
    }
    if title.len() > 200 {
        return Err("title must not exceed 200 characters".to_string());
    }
    if description.trim().is_empty() {
        return Err("description must not be empty".to_string());
    }
    if description.len() > 5000 {
        return Err("description must not exceed 5000 characters".to_string());
    }
    if address.trim().is_empty() {
        return Err("address must not be empty".to_string());
    }
    if address.len() > 500 {
        return Err("address must not exceed 500 characters".to_string());
    }
    Ok(())
}

fn validate_image_ref(image_ref: Option<&str>) -> Result<(), String> {
    if let Some(r) = image_ref {
        if r.len() > 512 {
            return Err("image_ref must not exceed 512 characters".to_string());
        }
    }
    Ok(())
}

/// Parse a status name, rejecting anything outside the closed set.
fn parse_status(raw: &str) -> Result<TicketStatus, AppError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|_| {
        AppError::Validation(format!(
            "invalid status '{raw}'. Valid statuses: OPEN, IN_PROGRESS, RESOLVED"
        ))
    })
}

/// Load a ticket or 404.
fn load_ticket(state: &AppState, id: Uuid) -> Result<Ticket, AppError> {
    state
        .tickets
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("ticket {id} not found")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /tickets — Report a new issue.
#[utoipa::path(
    post,
    path = "/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = CreateTicketResponse),
        (status = 400, description = "Validation failure", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not an individual", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    Caller(principal): Caller,
    body: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTicketResponse>), AppError> {
    let req = extract_validated_json(body)?;
    authorize(&principal, None, TicketAction::Create)?;

    let now = Utc::now();
    let id = TicketId::new();
    let ticket = Ticket::new(
        id,
        req.title,
        req.description,
        req.address,
        req.image_ref,
        principal.id,
        now,
    );

    state.tickets.insert(id.0, ticket.clone());

    // Persist to database (write-through). Failure is surfaced because the
    // in-memory record would be lost on restart.
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::tickets::insert(pool, &ticket).await {
            tracing::error!(ticket_id = %id, error = %e, "failed to persist ticket to database");
            return Err(AppError::Internal(
                "ticket recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(ticket_id = %id, owner = %principal.id, "ticket created");
    Ok((StatusCode::CREATED, Json(CreateTicketResponse { id: id.0 })))
}

/// GET /tickets — List tickets visible to the caller.
///
/// Individuals see their own tickets; organizations see the open pool plus
/// tickets assigned to them; admins see everything. Optional filters
/// compose with the role-based view.
#[utoipa::path(
    get,
    path = "/tickets",
    params(
        ("status" = Option<String>, Query, description = "Filter by status (OPEN, IN_PROGRESS, RESOLVED)"),
        ("location" = Option<String>, Query, description = "Substring match on the address"),
    ),
    responses(
        (status = 200, description = "Visible tickets", body = TicketListResponse),
        (status = 400, description = "Invalid filter", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<TicketListResponse>, AppError> {
    authorize(&principal, None, TicketAction::List)?;

    let status_filter = params.status.as_deref().map(parse_status).transpose()?;
    let location_filter = params.location.as_deref().map(str::to_lowercase);

    let mut visible: Vec<Ticket> = state
        .tickets
        .list()
        .into_iter()
        .filter(|t| can_view(&principal, t))
        .filter(|t| status_filter.map_or(true, |s| t.status == s))
        .filter(|t| {
            location_filter
                .as_deref()
                .map_or(true, |loc| t.address.to_lowercase().contains(loc))
        })
        .collect();

    // Most recent first.
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(TicketListResponse {
        tickets: visible.into_iter().map(TicketBody::from).collect(),
    }))
}

/// GET /tickets/stats — Aggregate counts for organizations and admins.
#[utoipa::path(
    get,
    path = "/tickets/stats",
    responses(
        (status = 200, description = "Aggregate statistics", body = TicketStatsResponse),
        (status = 403, description = "Individuals may not read stats", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn ticket_stats(
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Result<Json<TicketStatsResponse>, AppError> {
    authorize(&principal, None, TicketAction::Stats)?;

    let all = state.tickets.list();
    let week_ago = Utc::now() - Duration::days(7);
    let recent_7_days = all.iter().filter(|t| t.created_at >= week_ago).count();

    let by_status = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
    ]
    .into_iter()
    .map(|status| StatusCount {
        status: status.as_str().to_string(),
        count: all.iter().filter(|t| t.status == status).count(),
    })
    .collect();

    Ok(Json(TicketStatsResponse {
        total: all.len(),
        recent_7_days,
        by_status,
    }))
}

/// GET /tickets/{id} — View a single ticket, decorated with display info.
#[utoipa::path(
    get,
    path = "/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket found", body = TicketDetailResponse),
        (status = 403, description = "Not visible to the caller", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketDetailResponse>, AppError> {
    let ticket = load_ticket(&state, id)?;
    authorize(&principal, Some(&ticket), TicketAction::View)?;

    // Decoration happens after all store access; lookups hit the cache and
    // degrade to placeholders, never failing the request.
    let owner = state.user_info.get(ticket.owner_id).await;
    let assigned_company = match ticket.assigned_company_id {
        Some(company) => Some(state.user_info.get(company).await.into()),
        None => None,
    };

    Ok(Json(TicketDetailResponse {
        ticket: ticket.into(),
        owner: owner.into(),
        assigned_company,
    }))
}

/// PUT /tickets/{id} — Edit descriptive fields (owner or admin).
#[utoipa::path(
    put,
    path = "/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = UpdateTicketRequest,
    responses(
        (status = 200, description = "Ticket updated", body = TicketBody),
        (status = 400, description = "Validation failure", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn update_ticket(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateTicketRequest>, JsonRejection>,
) -> Result<Json<TicketBody>, AppError> {
    let req = extract_validated_json(body)?;
    let ticket = load_ticket(&state, id)?;
    authorize(&principal, Some(&ticket), TicketAction::Update)?;

    let now = Utc::now();
    let result = state
        .tickets
        .try_update(&id, |t| -> Result<Ticket, AppError> {
            t.title = req.title.clone();
            t.description = req.description.clone();
            t.address = req.address.clone();
            if let Some(image_ref) = &req.image_ref {
                t.image_ref = Some(image_ref.clone());
            }
            t.updated_at = now;
            Ok(t.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("ticket {id} not found")))?;
    let ticket = result?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::tickets::update_fields(pool, &ticket).await {
            tracing::error!(ticket_id = %id, error = %e, "failed to persist ticket update");
            return Err(AppError::Internal(
                "ticket updated in-memory but database persist failed".to_string(),
            ));
        }
    }

    Ok(Json(ticket.into()))
}

/// DELETE /tickets/{id} — Hard delete (admin only).
///
/// A peripheral administrative operation, not part of the lifecycle
/// machine; nothing transitions, the record is simply removed.
#[utoipa::path(
    delete,
    path = "/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket deleted", body = DeleteTicketResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn delete_ticket(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteTicketResponse>, AppError> {
    let ticket = load_ticket(&state, id)?;
    authorize(&principal, Some(&ticket), TicketAction::Delete)?;

    state.tickets.remove(&id);

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::tickets::delete(pool, id).await {
            tracing::error!(ticket_id = %id, error = %e, "failed to delete ticket from database");
            return Err(AppError::Internal(
                "ticket removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    tracing::info!(ticket_id = %id, admin = %principal.id, "ticket deleted");
    Ok(Json(DeleteTicketResponse { id }))
}

/// PATCH /tickets/{id}/assign — Claim an open ticket for the calling
/// organization.
///
/// The transition runs atomically: two organizations racing for the same
/// ticket serialize on the store lock, and the loser receives 409 with the
/// current status in the message.
#[utoipa::path(
    patch,
    path = "/tickets/{id}/assign",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket claimed", body = TicketBody),
        (status = 403, description = "Caller is not an organization", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ticket is not open", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn assign_ticket(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketBody>, AppError> {
    let ticket = load_ticket(&state, id)?;
    authorize(&principal, Some(&ticket), TicketAction::Assign)?;

    let now = Utc::now();
    let result = state
        .tickets
        .try_update(&id, |t| t.assign(principal.id, now).map(|_| t.clone()))
        .ok_or_else(|| AppError::NotFound(format!("ticket {id} not found")))?;
    let ticket = result?;

    persist_conditional(
        id,
        "assign",
        crate::db::tickets::assign_open(state.db_pool.as_ref(), &ticket).await,
    )?;

    tracing::info!(ticket_id = %id, company = %principal.id, "ticket assigned");
    Ok(Json(ticket.into()))
}

/// PATCH /tickets/{id}/complete — Mark the work finished.
#[utoipa::path(
    patch,
    path = "/tickets/{id}/complete",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket resolved", body = TicketBody),
        (status = 403, description = "Not the assigned organization", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ticket is not in progress", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn complete_ticket(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketBody>, AppError> {
    let ticket = load_ticket(&state, id)?;
    authorize(&principal, Some(&ticket), TicketAction::Complete)?;

    let now = Utc::now();
    let result = state
        .tickets
        .try_update(&id, |t| t.complete(principal.id, now).map(|_| t.clone()))
        .ok_or_else(|| AppError::NotFound(format!("ticket {id} not found")))?;
    let ticket = result?;

    persist_conditional(
        id,
        "complete",
        crate::db::tickets::complete_in_progress(state.db_pool.as_ref(), &ticket).await,
    )?;

    tracing::info!(ticket_id = %id, company = %principal.id, "ticket resolved");
    Ok(Json(ticket.into()))
}

/// PATCH /tickets/{id}/feedback — Owner feedback on a resolved ticket.
#[utoipa::path(
    patch,
    path = "/tickets/{id}/feedback",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback stored", body = TicketBody),
        (status = 400, description = "Validation failure", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ticket is not resolved", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn feedback_ticket(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<TicketBody>, AppError> {
    let req = extract_validated_json(body)?;
    let ticket = load_ticket(&state, id)?;
    authorize(&principal, Some(&ticket), TicketAction::Feedback)?;

    let now = Utc::now();
    let result = state
        .tickets
        .try_update(&id, |t| {
            t.leave_feedback(req.feedback.clone(), now).map(|_| t.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("ticket {id} not found")))?;
    let ticket = result?;

    persist_conditional(
        id,
        "feedback",
        crate::db::tickets::set_feedback(state.db_pool.as_ref(), &ticket).await,
    )?;

    tracing::info!(ticket_id = %id, owner = %principal.id, "feedback stored");
    Ok(Json(ticket.into()))
}

/// PATCH /tickets/{id}/status — Legacy direct status set.
///
/// **Deprecated.** Bypasses the lifecycle machine (can skip IN_PROGRESS or
/// reopen a RESOLVED ticket). Kept for compatibility with older admin
/// tooling; the response carries a `Deprecation` header and every use is
/// logged.
#[utoipa::path(
    patch,
    path = "/tickets/{id}/status",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = OverrideStatusRequest,
    responses(
        (status = 200, description = "Status overridden (deprecated path)", body = OverrideStatusResponse),
        (status = 400, description = "Invalid status", body = crate::error::ErrorBody),
        (status = 403, description = "Requires organization or admin", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub async fn override_status(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Path(id): Path<Uuid>,
    body: Result<Json<OverrideStatusRequest>, JsonRejection>,
) -> Result<([(&'static str, &'static str); 1], Json<OverrideStatusResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let target = parse_status(&req.status)?;

    let ticket = load_ticket(&state, id)?;
    authorize(&principal, Some(&ticket), TicketAction::OverrideStatus)?;

    let now = Utc::now();
    let result = state
        .tickets
        .try_update(&id, |t| -> Result<Ticket, AppError> {
            t.override_status(target, principal.id, now);
            Ok(t.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("ticket {id} not found")))?;
    let ticket = result?;

    let from = ticket
        .transition_log
        .last()
        .map(|r| r.from_status.as_str())
        .unwrap_or("?");
    tracing::warn!(
        ticket_id = %id,
        actor = %principal.id,
        from = from,
        to = %target,
        "legacy status override applied"
    );

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::tickets::override_row(pool, &ticket).await {
            tracing::error!(ticket_id = %id, error = %e, "failed to persist status override");
            return Err(AppError::Internal(
                "status overridden in-memory but database persist failed".to_string(),
            ));
        }
    }

    Ok((
        [("deprecation", "true")],
        Json(OverrideStatusResponse {
            ticket: ticket.into(),
            deprecated: true,
        }),
    ))
}

/// Map the result of a conditional write-through to the handler's error.
///
/// `Ok(None)` means no database is configured. `Ok(Some(false))` means the
/// in-memory state and the database row disagreed on the precondition —
/// surfaced as an internal error because the stores have diverged.
fn persist_conditional(
    id: Uuid,
    action: &'static str,
    outcome: Result<Option<bool>, sqlx::Error>,
) -> Result<(), AppError> {
    match outcome {
        Ok(None) | Ok(Some(true)) => Ok(()),
        Ok(Some(false)) => {
            tracing::error!(ticket_id = %id, action, "conditional database write matched no row");
            Err(AppError::Internal(format!(
                "{action} applied in-memory but the database row did not match the expected status"
            )))
        }
        Err(e) => {
            tracing::error!(ticket_id = %id, action, error = %e, "failed to persist transition");
            Err(AppError::Internal(format!(
                "{action} applied in-memory but database persist failed"
            )))
        }
    }
}

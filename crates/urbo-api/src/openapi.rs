//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the ticket service surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "URBO Ticket Service",
        version = "0.1.0",
        description = "Civic issue reporting: individuals file tickets, organizations claim and resolve them, admins oversee everything. Authentication is delegated to the identity service.",
        license(name = "Apache-2.0")
    ),
    paths(
        crate::routes::tickets::create_ticket,
        crate::routes::tickets::list_tickets,
        crate::routes::tickets::ticket_stats,
        crate::routes::tickets::get_ticket,
        crate::routes::tickets::update_ticket,
        crate::routes::tickets::delete_ticket,
        crate::routes::tickets::assign_ticket,
        crate::routes::tickets::complete_ticket,
        crate::routes::tickets::feedback_ticket,
        crate::routes::tickets::override_status,
    ),
    components(schemas(
        crate::routes::tickets::TicketBody,
        crate::routes::tickets::UserInfoBody,
        crate::routes::tickets::CreateTicketRequest,
        crate::routes::tickets::CreateTicketResponse,
        crate::routes::tickets::TicketListResponse,
        crate::routes::tickets::TicketDetailResponse,
        crate::routes::tickets::UpdateTicketRequest,
        crate::routes::tickets::FeedbackRequest,
        crate::routes::tickets::OverrideStatusRequest,
        crate::routes::tickets::OverrideStatusResponse,
        crate::routes::tickets::DeleteTicketResponse,
        crate::routes::tickets::StatusCount,
        crate::routes::tickets::TicketStatsResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tickets", description = "Ticket lifecycle operations")
    )
)]
pub struct ApiDoc;

/// Router serving the generated spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

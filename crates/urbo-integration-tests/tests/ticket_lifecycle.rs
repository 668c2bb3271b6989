//! End-to-end lifecycle tests: the full report → claim → resolve →
//! feedback path, claim races, and the legacy override escape hatch.

use axum::http::StatusCode;
use serde_json::json;

use urbo_integration_tests::{build_app, create_ticket, request, spawn_identity_stub};

#[tokio::test]
async fn full_lifecycle_scenario() {
    let identity = spawn_identity_stub().await;
    let app = build_app(identity.port);

    let (u1_id, u1) = identity.register("Maria Silva", "user", "cpf");
    let (o1_id, o1) = identity.register("Prefeitura", "organization", "cnpj");
    let (_o2_id, o2) = identity.register("Obras SA", "organization", "cnpj");

    // U1 reports a pothole.
    let (status, body) = request(
        &app,
        "POST",
        "/tickets",
        Some(&u1),
        Some(json!({
            "title": "Pothole",
            "description": "Deep pothole near the crossing",
            "address": "Main St 1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let ticket_id = body["id"].as_str().unwrap().to_string();

    // The ticket starts open and owned by U1.
    let (status, body) = request(&app, "GET", &format!("/tickets/{ticket_id}"), Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["status"], "OPEN");
    assert_eq!(body["ticket"]["owner_id"], u1_id.to_string());
    assert_eq!(body["ticket"]["assigned_company_id"], serde_json::Value::Null);
    // Decoration carries the owner's display info from the identity service.
    assert_eq!(body["owner"]["name"], "Maria Silva");

    // O1 claims it.
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/tickets/{ticket_id}/assign"),
        Some(&o1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["assigned_company_id"], o1_id.to_string());

    // O2 arrives too late: conflict, not forbidden — the rules allowed the
    // attempt, the lifecycle did not.
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/tickets/{ticket_id}/assign"),
        Some(&o2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("IN_PROGRESS"), "got: {message}");

    // O1 finishes the work.
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/tickets/{ticket_id}/complete"),
        Some(&o1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "RESOLVED");

    // U1 leaves feedback.
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/tickets/{ticket_id}/feedback"),
        Some(&u1),
        Some(json!({ "feedback": "Fixed well" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feedback"], "Fixed well");

    // The audit trail recorded both transitions.
    let (_, body) = request(&app, "GET", &format!("/tickets/{ticket_id}"), Some(&u1), None).await;
    let log = body["ticket"]["transition_log"].as_array().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0]["from_status"], "OPEN");
    assert_eq!(log[0]["to_status"], "IN_PROGRESS");
    assert_eq!(log[1]["to_status"], "RESOLVED");
    // The detail view now also names the assigned company.
    assert_eq!(body["assigned_company"]["name"], "Prefeitura");
}

#[tokio::test]
async fn concurrent_assigns_have_exactly_one_winner() {
    let identity = spawn_identity_stub().await;
    let app = build_app(identity.port);

    let (_u1_id, u1) = identity.register("Reporter", "user", "cpf");
    let (o1_id, o1) = identity.register("Org One", "organization", "cnpj");
    let (o2_id, o2) = identity.register("Org Two", "organization", "cnpj");

    let ticket_id = create_ticket(&app, &u1, "Broken lamp").await;
    let uri = format!("/tickets/{ticket_id}/assign");

    let (first, second) = tokio::join!(
        request(&app, "PATCH", &uri, Some(&o1), None),
        request(&app, "PATCH", &uri, Some(&o2), None),
    );

    let statuses = [first.0, second.0];
    assert!(
        statuses.contains(&StatusCode::OK),
        "exactly one claim must succeed: {statuses:?}"
    );
    assert!(
        statuses.contains(&StatusCode::CONFLICT),
        "exactly one claim must conflict: {statuses:?}"
    );

    // The final assignee is the winner's id.
    let winner_id = if first.0 == StatusCode::OK { o1_id } else { o2_id };
    let (_, admin_token) = identity.register("Admin", "admin", "cpf");
    let (_, body) = request(
        &app,
        "GET",
        &format!("/tickets/{ticket_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(body["ticket"]["assigned_company_id"], winner_id.to_string());
    assert_eq!(body["ticket"]["status"], "IN_PROGRESS");
}

#[tokio::test]
async fn complete_requires_in_progress_and_the_assignee() {
    let identity = spawn_identity_stub().await;
    let app = build_app(identity.port);

    let (_u1_id, u1) = identity.register("Reporter", "user", "cpf");
    let (_o1_id, o1) = identity.register("Org One", "organization", "cnpj");
    let (_o2_id, o2) = identity.register("Org Two", "organization", "cnpj");

    let ticket_id = create_ticket(&app, &u1, "Fallen tree").await;
    let complete_uri = format!("/tickets/{ticket_id}/complete");

    // Completing an open ticket is a lifecycle conflict.
    let (status, _) = request(&app, "PATCH", &complete_uri, Some(&o1), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // O1 claims it; O2 cannot complete someone else's work.
    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/tickets/{ticket_id}/assign"),
        Some(&o1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, "PATCH", &complete_uri, Some(&o2), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "body: {body}");

    // The assignee completes it.
    let (status, _) = request(&app, "PATCH", &complete_uri, Some(&o1), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn feedback_rules_are_enforced() {
    let identity = spawn_identity_stub().await;
    let app = build_app(identity.port);

    let (_u1_id, u1) = identity.register("Owner", "user", "cpf");
    let (_u2_id, u2) = identity.register("Stranger", "user", "cpf");
    let (_o1_id, o1) = identity.register("Org", "organization", "cnpj");

    let ticket_id = create_ticket(&app, &u1, "Graffiti").await;
    let feedback_uri = format!("/tickets/{ticket_id}/feedback");
    let payload = json!({ "feedback": "thanks" });

    // Feedback on an open ticket: conflict.
    let (status, _) = request(&app, "PATCH", &feedback_uri, Some(&u1), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Resolve the ticket.
    request(&app, "PATCH", &format!("/tickets/{ticket_id}/assign"), Some(&o1), None).await;
    request(&app, "PATCH", &format!("/tickets/{ticket_id}/complete"), Some(&o1), None).await;

    // A different individual cannot leave feedback.
    let (status, _) = request(&app, "PATCH", &feedback_uri, Some(&u2), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Neither can the organization.
    let (status, _) = request(&app, "PATCH", &feedback_uri, Some(&o1), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner can.
    let (status, body) = request(&app, "PATCH", &feedback_uri, Some(&u1), Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feedback"], "thanks");
}

#[tokio::test]
async fn legacy_override_bypasses_the_machine_and_is_flagged() {
    let identity = spawn_identity_stub().await;
    let app = build_app(identity.port);

    let (_u1_id, u1) = identity.register("Owner", "user", "cpf");
    let (_admin_id, admin) = identity.register("Admin", "admin", "cpf");

    let ticket_id = create_ticket(&app, &u1, "Noise complaint").await;
    let status_uri = format!("/tickets/{ticket_id}/status");

    // Individuals may not touch the escape hatch.
    let (status, _) = request(
        &app,
        "PATCH",
        &status_uri,
        Some(&u1),
        Some(json!({ "status": "RESOLVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Unknown status names are rejected.
    let (status, _) = request(
        &app,
        "PATCH",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "DONE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The admin can skip IN_PROGRESS entirely — something the canonical
    // machine never allows.
    let (status, body) = request(
        &app,
        "PATCH",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "RESOLVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deprecated"], true);
    assert_eq!(body["ticket"]["status"], "RESOLVED");
    let log = body["ticket"]["transition_log"].as_array().unwrap();
    assert_eq!(log[0]["reason"], "legacy status override");

    // And reopen it again.
    let (status, body) = request(
        &app,
        "PATCH",
        &status_uri,
        Some(&admin),
        Some(json!({ "status": "OPEN" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["status"], "OPEN");
}

#[tokio::test]
async fn update_and_delete_permissions() {
    let identity = spawn_identity_stub().await;
    let app = build_app(identity.port);

    let (_u1_id, u1) = identity.register("Owner", "user", "cpf");
    let (_u2_id, u2) = identity.register("Stranger", "user", "cpf");
    let (_admin_id, admin) = identity.register("Admin", "admin", "cpf");

    let ticket_id = create_ticket(&app, &u1, "Sidewalk crack").await;
    let uri = format!("/tickets/{ticket_id}");
    let edit = json!({
        "title": "Sidewalk crack (updated)",
        "description": "now with measurements",
        "address": "Main St 2"
    });

    // A stranger cannot edit.
    let (status, _) = request(&app, "PUT", &uri, Some(&u2), Some(edit.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner can.
    let (status, body) = request(&app, "PUT", &uri, Some(&u1), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Sidewalk crack (updated)");
    assert_eq!(body["address"], "Main St 2");

    // Deletion is admin-only.
    let (status, _) = request(&app, "DELETE", &uri, Some(&u1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_aggregates_by_status() {
    let identity = spawn_identity_stub().await;
    let app = build_app(identity.port);

    let (_u1_id, u1) = identity.register("Owner", "user", "cpf");
    let (_o1_id, o1) = identity.register("Org", "organization", "cnpj");

    for title in ["a", "b", "c"] {
        create_ticket(&app, &u1, title).await;
    }
    let claimed = create_ticket(&app, &u1, "claimed").await;
    request(&app, "PATCH", &format!("/tickets/{claimed}/assign"), Some(&o1), None).await;

    // Individuals may not read stats.
    let (status, _) = request(&app, "GET", "/tickets/stats", Some(&u1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(&app, "GET", "/tickets/stats", Some(&o1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["recent_7_days"], 4);
    let by_status = body["by_status"].as_array().unwrap();
    let count_of = |name: &str| {
        by_status
            .iter()
            .find(|e| e["status"] == name)
            .and_then(|e| e["count"].as_u64())
            .unwrap()
    };
    assert_eq!(count_of("OPEN"), 3);
    assert_eq!(count_of("IN_PROGRESS"), 1);
    assert_eq!(count_of("RESOLVED"), 0);
}

#[tokio::test]
async fn create_validates_required_fields() {
    let identity = spawn_identity_stub().await;
    let app = build_app(identity.port);

    let (_u1_id, u1) = identity.register("Owner", "user", "cpf");
    let (_o1_id, o1) = identity.register("Org", "organization", "cnpj");

    // Missing description.
    let (status, body) = request(
        &app,
        "POST",
        "/tickets",
        Some(&u1),
        Some(json!({ "title": "Pothole", "address": "Main St 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");

    // Blank title.
    let (status, body) = request(
        &app,
        "POST",
        "/tickets",
        Some(&u1),
        Some(json!({ "title": "  ", "description": "d", "address": "a" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Organizations do not report issues.
    let (status, _) = request(
        &app,
        "POST",
        "/tickets",
        Some(&o1),
        Some(json!({ "title": "t", "description": "d", "address": "a" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

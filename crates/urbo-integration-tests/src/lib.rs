//! Shared harness for the integration tests.
//!
//! Boots the identity stub on an ephemeral port, builds the ticket service
//! against it, and provides request helpers for driving the router with
//! `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use urbo_identity_client::{IdentityClient, IdentityConfig};
use urbo_identity_stub::{AppState as StubState, StubUser};

/// A running identity stub plus direct access to its store.
pub struct IdentityFixture {
    /// Port the stub is listening on.
    pub port: u16,
    /// The stub's store, for seeding and fault injection.
    pub state: StubState,
}

/// Boot the identity stub on an ephemeral port.
pub async fn spawn_identity_stub() -> IdentityFixture {
    let state = StubState::new();
    let app = urbo_identity_stub::router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("stub server error");
    });

    IdentityFixture { port, state }
}

impl IdentityFixture {
    /// Seed a user and mint a token for them.
    pub fn register(&self, name: &str, role: &str, document_type: &str) -> (Uuid, String) {
        let user = StubUser {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            document_type: Some(document_type.to_string()),
            role: Some(role.to_string()),
        };
        let id = user.id;
        let token = self.state.register(user);
        (id, token)
    }
}

/// Build the ticket service wired to the identity stub.
pub fn build_app(identity_port: u16) -> axum::Router {
    let identity = IdentityClient::new(IdentityConfig::local(identity_port, Some("svc-token")))
        .expect("identity client");
    urbo_api::app(urbo_api::AppState::new(identity))
}

/// Build the ticket service wired to a dead identity endpoint.
pub fn build_app_with_dead_identity() -> axum::Router {
    let identity =
        IdentityClient::new(IdentityConfig::local(1, None)).expect("identity client");
    urbo_api::app(urbo_api::AppState::new(identity))
}

/// Drive one request through the router, returning status and JSON body.
pub async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Create a ticket as the given individual and return its id.
pub async fn create_ticket(app: &axum::Router, token: &str, title: &str) -> Uuid {
    let (status, body) = request(
        app,
        "POST",
        "/tickets",
        Some(token),
        Some(serde_json::json!({
            "title": title,
            "description": "integration test ticket",
            "address": "Main St 1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("created ticket id")
}

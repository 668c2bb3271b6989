//! # urbo-identity-stub — In-Memory Identity Service
//!
//! Standalone implementation of the identity service endpoints that
//! `urbo-identity-client` calls, with responses that deserialize cleanly
//! into the client's types. For development and integration testing —
//! storage is in-memory (DashMap) with no persistence; data is lost on
//! restart.
//!
//! Exposed as a library so integration tests can mount the router on an
//! ephemeral port; the binary in `main.rs` is a thin wrapper.

pub mod routes;
pub mod store;

pub use routes::router;
pub use store::{AppState, StubUser};

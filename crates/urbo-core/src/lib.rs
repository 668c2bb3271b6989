//! # urbo-core — Foundational Types for URBO
//!
//! The leaf crate of the URBO workspace. It defines the identifier newtypes
//! and the principal model that every other crate builds on; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `UserId` and `TicketId` are
//!    distinct types — you cannot pass a user where a ticket is expected.
//!    No bare strings or UUIDs for identifiers.
//!
//! 2. **Single closed `Role` enum.** The identity service historically carried
//!    the caller's role across two inconsistent fields (`role` string and
//!    `document_type`). [`Role::from_claims`] consolidates them exactly once;
//!    downstream code matches on the enum and never sees the raw strings.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `urbo-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod identity;
pub mod principal;

pub use identity::{TicketId, UserId};
pub use principal::{Principal, PrincipalError, Role};

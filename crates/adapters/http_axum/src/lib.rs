//! # safelink-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for programmatic access
//!   (`/api/emergencies`, `/api/users`, `/api/subscriptions`, `/api/events`)
//! - Map HTTP requests into commands and hand them to the command handlers
//!   (driving adapter); writes are answered with `202 Accepted` once the
//!   resulting event has been dispatched
//! - Serve read queries straight from the store ports
//! - Accept externally produced events in any known shape and publish them
//!
//! ## Dependency rule
//! Depends on `safelink-app` (for port traits and handlers) and `safelink-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

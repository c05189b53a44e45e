//! # safelink-app
//!
//! Application layer: commands, handlers, subscribers and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EmergencyStore`: load/save emergencies, read-side queries
//!   - `UserStore`: load/save users and the subscriptions they own
//!   - `EventPublisher` / `EventSubscriber`: the event bus contract
//! - Define **driving/inbound ports** as commands plus one `CommandHandler` each
//! - Provide **in-process infrastructure** (event bus with an explicit routing
//!   table) that doesn't need IO
//! - Apply events to aggregates through subscribers
//!
//! ## Control flow
//! caller → handler → publish event → bus → subscriber → store load →
//! aggregate mutation → store save
//!
//! ## Dependency rule
//! Depends on `safelink-domain` only (plus `tokio::sync` / `tokio-util` for
//! channels and cancellation). Never imports adapter crates. Adapters depend
//! on *this* crate, not the reverse.

pub mod cancellation;
pub mod commands;
pub mod event_bus;
pub mod handlers;
pub mod ports;
pub mod subscribers;
pub mod wiring;

#[cfg(test)]
mod test_support;

//! # safelink-domain
//!
//! Pure domain model for the safelink emergency check-in system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Value objects: [`location::Location`], [`area::Area`], emergency responses
//! - **Emergencies**: declared situations that collect check-ins until resolved
//! - **Users** and the **Subscriptions** they own (who follows whom)
//! - **Events**: the records that drive every state change, plus the adapter
//!   for older event shapes
//! - All invariant enforcement and state-machine logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod area;
pub mod emergency;
pub mod event;
pub mod location;
pub mod user;

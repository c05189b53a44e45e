//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the handler/subscriber layer
//! and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod emergency_store;
pub mod event_bus;
pub mod user_store;

pub use emergency_store::EmergencyStore;
pub use event_bus::{BoxFuture, EventPublisher, EventSubscriber};
pub use user_store::UserStore;

//! Shared application state for axum handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use safelink_app::handlers::Handlers;
use safelink_app::ports::{EmergencyStore, EventPublisher, UserStore};

/// Application state shared across all axum handlers.
///
/// Generic over the event publisher and both stores to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<P, E, U> {
    /// Command handlers; writes go through here and the event bus.
    pub handlers: Arc<Handlers<P, U>>,
    /// Publisher used by the event ingress endpoint.
    pub publisher: Arc<P>,
    /// Read side for emergencies.
    pub emergencies: Arc<E>,
    /// Users, read and written directly for registration and settings.
    pub users: Arc<U>,
    /// Cancelled when the server shuts down; in-flight work observes it.
    pub shutdown: CancellationToken,
}

impl<P, E, U> Clone for AppState<P, E, U> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            publisher: Arc::clone(&self.publisher),
            emergencies: Arc::clone(&self.emergencies),
            users: Arc::clone(&self.users),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<P, E, U> AppState<P, E, U>
where
    P: EventPublisher + Clone + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    /// Build the state and the command handlers sharing `publisher` and `users`.
    pub fn new(publisher: P, emergencies: E, users: U, shutdown: CancellationToken) -> Self {
        Self {
            handlers: Arc::new(Handlers::new(publisher.clone(), users.clone())),
            publisher: Arc::new(publisher),
            emergencies: Arc::new(emergencies),
            users: Arc::new(users),
            shutdown,
        }
    }
}

//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod emergencies;
#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod subscriptions;
#[allow(clippy::missing_errors_doc)]
pub mod users;

use axum::Router;
use axum::routing::{get, post, put};

use safelink_app::ports::{EmergencyStore, EventPublisher, UserStore};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<P, E, U>() -> Router<AppState<P, E, U>>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    Router::new()
        // Emergencies
        .route(
            "/emergencies",
            get(emergencies::list::<P, E, U>).post(emergencies::start::<P, E, U>),
        )
        .route("/emergencies/{id}", get(emergencies::get::<P, E, U>))
        .route("/emergencies/{id}/end", post(emergencies::end::<P, E, U>))
        .route(
            "/emergencies/{id}/status",
            post(emergencies::mark_status::<P, E, U>),
        )
        // Users
        .route(
            "/users",
            get(users::list::<P, E, U>).post(users::create::<P, E, U>),
        )
        .route(
            "/users/{id}",
            get(users::get::<P, E, U>).delete(users::delete::<P, E, U>),
        )
        .route("/users/{id}/approval", put(users::set_approval::<P, E, U>))
        .route(
            "/users/{id}/subscriptions",
            get(users::subscriptions::<P, E, U>),
        )
        // Subscriptions
        .route("/subscriptions", post(subscriptions::request::<P, E, U>))
        .route(
            "/subscriptions/approve",
            post(subscriptions::approve::<P, E, U>),
        )
        .route(
            "/subscriptions/reject",
            post(subscriptions::reject::<P, E, U>),
        )
        // External events
        .route("/events", post(events::ingest::<P, E, U>))
}

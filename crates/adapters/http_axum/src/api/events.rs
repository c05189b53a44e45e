//! Ingress for events produced outside this process.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;

use safelink_app::ports::{EmergencyStore, EventPublisher, UserStore};
use safelink_domain::event::EventEnvelope;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/events`
///
/// Accepts any known event shape, upgrades it and publishes it on the bus.
pub async fn ingest<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let event = EventEnvelope::decode_value(body)?;
    tracing::debug!(
        event_type = %event.event_type(),
        event_id = %event.event_id(),
        "external event received"
    );
    state.publisher.publish(event, &state.shutdown).await?;
    Ok(StatusCode::ACCEPTED)
}

//! JSON REST handlers for follow requests.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use safelink_app::commands::{ApproveSubscription, RejectSubscription, RequestSubscription};
use safelink_app::handlers::CommandHandler;
use safelink_app::ports::{EmergencyStore, EventPublisher, UserStore};
use safelink_domain::id::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body shared by every subscription endpoint.
#[derive(Clone, Copy, Deserialize)]
pub struct SubscriptionRequest {
    pub subscriber_id: UserId,
    pub subscribed_to_id: UserId,
}

/// `POST /api/subscriptions`
pub async fn request<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<StatusCode, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let command = RequestSubscription {
        subscriber_id: req.subscriber_id,
        subscribed_to_id: req.subscribed_to_id,
    };
    state
        .handlers
        .request_subscription
        .handle(command, &state.shutdown)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/subscriptions/approve`
pub async fn approve<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<StatusCode, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let command = ApproveSubscription {
        subscriber_id: req.subscriber_id,
        subscribed_to_id: req.subscribed_to_id,
    };
    state
        .handlers
        .approve_subscription
        .handle(command, &state.shutdown)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/subscriptions/reject`
pub async fn reject<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<StatusCode, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let command = RejectSubscription {
        subscriber_id: req.subscriber_id,
        subscribed_to_id: req.subscribed_to_id,
    };
    state
        .handlers
        .reject_subscription
        .handle(command, &state.shutdown)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

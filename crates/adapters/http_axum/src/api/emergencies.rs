//! JSON REST handlers for emergencies.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use safelink_app::commands::{EndEmergency, MarkUserStatus, StartEmergency};
use safelink_app::handlers::CommandHandler;
use safelink_app::ports::{EmergencyStore, EventPublisher, UserStore};
use safelink_domain::area::Area;
use safelink_domain::emergency::{
    Emergency, EmergencyAttachments, EmergencyStatus, EmergencyType, Severity,
};
use safelink_domain::id::{EmergencyId, UserId};
use safelink_domain::location::Location;
use safelink_domain::user::UserStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// Coordinates as sent by clients, checked before use.
#[derive(Deserialize)]
pub struct LocationBody {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: String,
}

/// Request body for declaring an emergency.
#[derive(Deserialize)]
pub struct StartEmergencyRequest {
    pub initiator_user_id: UserId,
    pub emergency_type: Option<EmergencyType>,
    pub location: LocationBody,
    #[serde(default)]
    pub affected_areas: Vec<Area>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    pub attachments: Option<EmergencyAttachments>,
}

/// Request body for ending an emergency.
#[derive(Default, Deserialize)]
pub struct EndEmergencyRequest {
    pub resolution_note: Option<String>,
}

/// Request body for a user check-in.
#[derive(Deserialize)]
pub struct MarkStatusRequest {
    pub user_id: UserId,
    pub status: UserStatus,
    #[serde(default)]
    pub message: String,
}

/// Query string filters for the list endpoint.
#[derive(Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<EmergencyStatus>,
    pub user_id: Option<UserId>,
}

/// Body of the `202 Accepted` answer to a start request.
#[derive(Serialize)]
pub struct Started {
    pub id: EmergencyId,
}

/// Possible responses from the command endpoints.
pub enum CommandResponse {
    Started(Json<Started>),
    Accepted,
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Started(json) => (StatusCode::ACCEPTED, json).into_response(),
            Self::Accepted => StatusCode::ACCEPTED.into_response(),
        }
    }
}

/// Possible responses from the query endpoints.
pub enum QueryResponse {
    List(Json<Vec<Emergency>>),
    One(Json<Emergency>),
}

impl IntoResponse for QueryResponse {
    fn into_response(self) -> Response {
        match self {
            Self::List(json) => json.into_response(),
            Self::One(json) => json.into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<EmergencyId, ApiError> {
    EmergencyId::from_str(raw).map_err(|_| ApiError::invalid_id(raw))
}

/// `POST /api/emergencies`
pub async fn start<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Json(req): Json<StartEmergencyRequest>,
) -> Result<CommandResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let location = Location::try_new(
        req.location.latitude,
        req.location.longitude,
        req.location.description,
    )?;
    let command = StartEmergency {
        initiator_user_id: req.initiator_user_id,
        emergency_type: req.emergency_type,
        location,
        affected_areas: req.affected_areas,
        severity: req.severity,
        description: req.description,
        attachments: req.attachments,
    };

    let id = state
        .handlers
        .start_emergency
        .handle(command, &state.shutdown)
        .await?;
    Ok(CommandResponse::Started(Json(Started { id })))
}

/// `GET /api/emergencies?status=…&user_id=…`
pub async fn list<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Query(query): Query<ListQuery>,
) -> Result<QueryResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let emergencies = match (query.user_id, query.status) {
        (Some(user_id), status) => state
            .emergencies
            .get_by_user(user_id)
            .await?
            .into_iter()
            .filter(|e| status.is_none_or(|s| e.status() == s))
            .collect(),
        (None, Some(status)) => state.emergencies.get_by_status(status).await?,
        (None, None) => state.emergencies.get_all().await?,
    };
    Ok(QueryResponse::List(Json(emergencies)))
}

/// `GET /api/emergencies/{id}`
pub async fn get<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Path(id): Path<String>,
) -> Result<QueryResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let emergency_id = parse_id(&id)?;
    let emergency = state
        .emergencies
        .get_by_id(emergency_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Emergency", id))?;
    Ok(QueryResponse::One(Json(emergency)))
}

/// `POST /api/emergencies/{id}/end`
///
/// Accepted even when the emergency is unknown; ending it is then a no-op.
/// The JSON body is optional.
pub async fn end<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Path(id): Path<String>,
    req: Option<Json<EndEmergencyRequest>>,
) -> Result<CommandResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let Json(req) = req.unwrap_or_default();
    let command = EndEmergency {
        emergency_id: parse_id(&id)?,
        resolution_note: req.resolution_note,
    };
    state
        .handlers
        .end_emergency
        .handle(command, &state.shutdown)
        .await?;
    Ok(CommandResponse::Accepted)
}

/// `POST /api/emergencies/{id}/status`
pub async fn mark_status<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Path(id): Path<String>,
    Json(req): Json<MarkStatusRequest>,
) -> Result<CommandResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let command = MarkUserStatus {
        user_id: req.user_id,
        emergency_id: parse_id(&id)?,
        status: req.status,
        message: req.message,
    };
    state
        .handlers
        .mark_user_status
        .handle(command, &state.shutdown)
        .await?;
    Ok(CommandResponse::Accepted)
}

//! JSON REST handlers for users and their settings.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use safelink_app::ports::{EmergencyStore, EventPublisher, UserStore};
use safelink_domain::id::UserId;
use safelink_domain::user::{NotificationChannel, Subscription, User};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering a user.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,
    #[serde(default)]
    pub notification_channels: Vec<NotificationChannel>,
}

fn default_requires_approval() -> bool {
    true
}

/// Request body for the approval setting.
#[derive(Deserialize)]
pub struct ApprovalRequest {
    pub requires_approval: bool,
}

/// Query string filters for the list endpoint.
#[derive(Default, Deserialize)]
pub struct ListQuery {
    pub email: Option<String>,
}

/// Possible responses from the user endpoints.
pub enum UserResponse {
    Created(Json<User>),
    One(Json<User>),
    List(Json<Vec<User>>),
    Subscriptions(Json<Vec<Subscription>>),
    NoContent,
}

impl IntoResponse for UserResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::One(json) => json.into_response(),
            Self::List(json) => json.into_response(),
            Self::Subscriptions(json) => json.into_response(),
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::from_str(raw).map_err(|_| ApiError::invalid_id(raw))
}

async fn load<U: UserStore>(users: &U, raw: &str) -> Result<User, ApiError> {
    let user = users.get_by_id(parse_id(raw)?).await?;
    if user.is_none() {
        return Err(ApiError::not_found("User", raw));
    }
    Ok(user)
}

/// `POST /api/users`
pub async fn create<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<UserResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let user = User::builder()
        .name(req.name)
        .email(req.email)
        .phone_number(req.phone_number)
        .requires_approval(req.requires_approval)
        .notification_channels(req.notification_channels)
        .build()?;

    let created = state.users.add(user).await?;
    tracing::info!(user_id = %created.id(), "user registered");
    Ok(UserResponse::Created(Json(created)))
}

/// `GET /api/users[?email=…]`
pub async fn list<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Query(query): Query<ListQuery>,
) -> Result<UserResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let users = match query.email {
        Some(email) => state.users.get_by_email(&email).await?.into_iter().collect(),
        None => state.users.get_all().await?,
    };
    Ok(UserResponse::List(Json(users)))
}

/// `GET /api/users/{id}`
pub async fn get<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Path(id): Path<String>,
) -> Result<UserResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let user = load(state.users.as_ref(), &id).await?;
    Ok(UserResponse::One(Json(user)))
}

/// `DELETE /api/users/{id}`
pub async fn delete<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Path(id): Path<String>,
) -> Result<UserResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    if !state.users.delete(parse_id(&id)?).await? {
        return Err(ApiError::not_found("User", id));
    }
    Ok(UserResponse::NoContent)
}

/// `PUT /api/users/{id}/approval`
pub async fn set_approval<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Path(id): Path<String>,
    Json(req): Json<ApprovalRequest>,
) -> Result<UserResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let mut user = load(state.users.as_ref(), &id).await?;
    user.set_requires_approval(req.requires_approval);
    let saved = state.users.save(user).await?;
    Ok(UserResponse::One(Json(saved)))
}

/// `GET /api/users/{id}/subscriptions`
///
/// The users `{id}` follows, whatever their approval state.
pub async fn subscriptions<P, E, U>(
    State(state): State<AppState<P, E, U>>,
    Path(id): Path<String>,
) -> Result<UserResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Send + Sync + 'static,
{
    let subscriptions = state.users.subscriptions_of(parse_id(&id)?).await?;
    Ok(UserResponse::Subscriptions(Json(subscriptions)))
}

//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use safelink_domain::error::{NotFoundError, SafelinkError, ValidationError};
use safelink_domain::event::EventDecodeError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`SafelinkError`] and ingress decoding failures to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Domain(SafelinkError),
    MalformedEvent(EventDecodeError),
}

impl ApiError {
    pub(crate) fn invalid_id(raw: &str) -> Self {
        Self::Domain(ValidationError::InvalidId(raw.to_string()).into())
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::Domain(
            NotFoundError {
                entity,
                id: id.to_string(),
            }
            .into(),
        )
    }
}

impl From<SafelinkError> for ApiError {
    fn from(err: SafelinkError) -> Self {
        Self::Domain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<EventDecodeError> for ApiError {
    fn from(err: EventDecodeError) -> Self {
        Self::MalformedEvent(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Domain(SafelinkError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, format!("validation error: {err}"))
            }
            Self::Domain(SafelinkError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(SafelinkError::Conflict(err)) => (StatusCode::CONFLICT, err.to_string()),
            Self::Domain(SafelinkError::Cancelled) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service is shutting down".to_string(),
            ),
            Self::Domain(SafelinkError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            Self::MalformedEvent(err) => (StatusCode::BAD_REQUEST, err.to_string()),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SafelinkError`] via `From`.

use std::error::Error as StdError;

/// Top-level error shared by the domain, application, and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum SafelinkError {
    /// A domain invariant was violated while constructing or mutating a value.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A requested aggregate does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The stored aggregate changed since it was loaded.
    #[error("concurrent modification")]
    Conflict(#[from] ConflictError),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// An opaque failure from a store or transport.
    #[error("storage error")]
    Storage(#[source] Box<dyn StdError + Send + Sync>),
}

/// Argument rejections raised at construction time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("location is required")]
    MissingLocation,

    #[error("coordinates are out of range")]
    InvalidCoordinates,

    #[error("name must not be blank")]
    EmptyName,

    #[error("email must not be blank")]
    EmptyEmail,

    #[error("phone number must not be blank")]
    EmptyPhoneNumber,

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown value: {0}")]
    UnknownValue(String),
}

/// A lookup by id found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Optimistic concurrency failure: the caller held a stale version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} was modified concurrently (expected version {expected_version})")]
pub struct ConflictError {
    pub entity: &'static str,
    pub id: String,
    pub expected_version: u64,
}

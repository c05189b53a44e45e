//! Storage-specific error type wrapping sqlx errors.

use safelink_domain::error::{SafelinkError, ValidationError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to (de)serialize a JSON column.
    #[error("JSON column error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row no longer satisfies a domain invariant.
    #[error("stored row is invalid")]
    Invalid(#[from] ValidationError),
}

impl From<StorageError> for SafelinkError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Wrap any decoding failure so it can be returned from `FromRow`.
pub(crate) fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

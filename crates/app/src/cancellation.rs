//! Racing store and bus futures against a [`CancellationToken`].

use std::future::Future;

use safelink_domain::error::SafelinkError;
use tokio_util::sync::CancellationToken;

/// Run `fut` unless `cancel` fires first.
///
/// On cancellation `fut` is dropped before completion, which for a
/// transactional store rolls back any partial write.
///
/// # Errors
///
/// Returns [`SafelinkError::Cancelled`] when the token fires first, otherwise
/// whatever `fut` returns.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, SafelinkError>
where
    F: Future<Output = Result<T, SafelinkError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(SafelinkError::Cancelled),
        result = fut => result,
    }
}

//! Caches a user's latest reported status on the subscriptions it owns,
//! so followers can see it without querying emergencies.

use tokio_util::sync::CancellationToken;

use safelink_domain::error::SafelinkError;
use safelink_domain::event::{DomainEvent, UserStatusMarked};

use crate::cancellation::cancellable;
use crate::ports::{BoxFuture, EventSubscriber, UserStore};

/// Handles `UserStatusMarked` on the user side.
pub struct StatusBroadcastSubscriber<S> {
    store: S,
}

impl<S> StatusBroadcastSubscriber<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: UserStore + Send + Sync> StatusBroadcastSubscriber<S> {
    #[tracing::instrument(skip_all, fields(user_id = %event.user_id, status = %event.status))]
    async fn on_status_marked(
        &self,
        event: &UserStatusMarked,
        cancel: &CancellationToken,
    ) -> Result<(), SafelinkError> {
        let mut user = cancellable(cancel, self.store.get_by_id(event.user_id)).await?;
        if user.is_none() {
            tracing::debug!("user not found, ignoring");
            return Ok(());
        }
        let updated = user.record_status(event.status);
        if updated == 0 {
            tracing::debug!("user has no subscribers");
            return Ok(());
        }
        cancellable(cancel, self.store.save(user)).await?;
        tracing::debug!(updated, "status cached for subscribers");
        Ok(())
    }
}

impl<S: UserStore + Send + Sync> EventSubscriber for StatusBroadcastSubscriber<S> {
    fn name(&self) -> &'static str {
        "status_broadcast"
    }

    fn on_event<'a>(
        &'a self,
        event: &'a DomainEvent,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), SafelinkError>> {
        Box::pin(async move {
            match event {
                DomainEvent::UserStatusMarked(e) => self.on_status_marked(e, cancel).await,
                _ => Ok(()),
            }
        })
    }
}

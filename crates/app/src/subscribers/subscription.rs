//! Applies subscription events to the subscribed-to [`User`].
//!
//! [`User`]: safelink_domain::user::User

use tokio_util::sync::CancellationToken;

use safelink_domain::error::SafelinkError;
use safelink_domain::event::DomainEvent;
use safelink_domain::id::UserId;
use safelink_domain::user::User;

use crate::cancellation::cancellable;
use crate::ports::{BoxFuture, EventSubscriber, UserStore};

/// Handles `SubscriptionRequested`, `SubscriptionApproved` and `SubscriptionRejected`.
pub struct SubscriptionEventSubscriber<S> {
    store: S,
}

impl<S> SubscriptionEventSubscriber<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: UserStore + Send + Sync> SubscriptionEventSubscriber<S> {
    /// Load the owner, run `mutate`, and save when it reports a change.
    #[tracing::instrument(skip_all, fields(%subscriber_id, %subscribed_to_id, %action))]
    async fn apply<F>(
        &self,
        subscriber_id: UserId,
        subscribed_to_id: UserId,
        action: &'static str,
        cancel: &CancellationToken,
        mutate: F,
    ) -> Result<(), SafelinkError>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        let mut owner = cancellable(cancel, self.store.get_by_id(subscribed_to_id)).await?;
        if owner.is_none() {
            tracing::debug!("subscribed-to user not found, ignoring");
            return Ok(());
        }
        if !mutate(&mut owner) {
            tracing::debug!("no matching change, ignoring");
            return Ok(());
        }

        let owner = cancellable(cancel, self.store.save(owner)).await?;
        let status = owner
            .subscription_from(subscriber_id)
            .map(|s| s.status().as_str());
        tracing::info!(status, "subscription {action}");
        Ok(())
    }
}

impl<S: UserStore + Send + Sync> EventSubscriber for SubscriptionEventSubscriber<S> {
    fn name(&self) -> &'static str {
        "subscription"
    }

    fn on_event<'a>(
        &'a self,
        event: &'a DomainEvent,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), SafelinkError>> {
        Box::pin(async move {
            match event {
                DomainEvent::SubscriptionRequested(e) => {
                    self.apply(e.subscriber_id, e.subscribed_to_id, "requested", cancel, |u| {
                        u.on_subscription_requested(e)
                    })
                    .await
                }
                DomainEvent::SubscriptionApproved(e) => {
                    self.apply(e.subscriber_id, e.subscribed_to_id, "approved", cancel, |u| {
                        u.on_subscription_approved(e)
                    })
                    .await
                }
                DomainEvent::SubscriptionRejected(e) => {
                    self.apply(e.subscriber_id, e.subscribed_to_id, "rejected", cancel, |u| {
                        u.on_subscription_rejected(e)
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

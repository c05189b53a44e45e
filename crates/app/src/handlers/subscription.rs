//! Subscription command handlers.
//!
//! The subscribed-to user owns the relationship, so approve/reject only
//! look up the subscriber for diagnostics and never write it back.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use safelink_domain::error::SafelinkError;
use safelink_domain::event::{SubscriptionApproved, SubscriptionRejected, SubscriptionRequested};
use safelink_domain::id::UserId;

use super::CommandHandler;
use crate::cancellation::cancellable;
use crate::commands::{ApproveSubscription, RejectSubscription, RequestSubscription};
use crate::ports::{EventPublisher, UserStore};

/// Publishes `SubscriptionRequested`.
pub struct RequestSubscriptionHandler<P> {
    publisher: P,
}

impl<P> RequestSubscriptionHandler<P> {
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }
}

impl<P: EventPublisher + Send + Sync> CommandHandler<RequestSubscription>
    for RequestSubscriptionHandler<P>
{
    type Output = ();

    fn handle(
        &self,
        command: RequestSubscription,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send {
        let event = SubscriptionRequested::new(command.subscriber_id, command.subscribed_to_id);
        tracing::debug!(
            subscriber_id = %command.subscriber_id,
            subscribed_to_id = %command.subscribed_to_id,
            "requesting subscription"
        );
        self.publisher.publish(event.into(), cancel)
    }
}

async fn check_subscriber<U: UserStore>(
    users: &U,
    subscriber_id: UserId,
    cancel: &CancellationToken,
) -> Result<(), SafelinkError> {
    let subscriber = cancellable(cancel, users.get_by_id(subscriber_id)).await?;
    if subscriber.is_none() {
        tracing::debug!(%subscriber_id, "subscriber is not a known user");
    }
    Ok(())
}

/// Publishes `SubscriptionApproved`.
pub struct ApproveSubscriptionHandler<P, U> {
    publisher: P,
    users: U,
}

impl<P, U> ApproveSubscriptionHandler<P, U> {
    pub fn new(publisher: P, users: U) -> Self {
        Self { publisher, users }
    }
}

impl<P, U> CommandHandler<ApproveSubscription> for ApproveSubscriptionHandler<P, U>
where
    P: EventPublisher + Send + Sync,
    U: UserStore + Send + Sync,
{
    type Output = ();

    fn handle(
        &self,
        command: ApproveSubscription,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send {
        async move {
            check_subscriber(&self.users, command.subscriber_id, cancel).await?;
            let event = SubscriptionApproved::new(command.subscriber_id, command.subscribed_to_id);
            self.publisher.publish(event.into(), cancel).await
        }
    }
}

/// Publishes `SubscriptionRejected`.
pub struct RejectSubscriptionHandler<P, U> {
    publisher: P,
    users: U,
}

impl<P, U> RejectSubscriptionHandler<P, U> {
    pub fn new(publisher: P, users: U) -> Self {
        Self { publisher, users }
    }
}

impl<P, U> CommandHandler<RejectSubscription> for RejectSubscriptionHandler<P, U>
where
    P: EventPublisher + Send + Sync,
    U: UserStore + Send + Sync,
{
    type Output = ();

    fn handle(
        &self,
        command: RejectSubscription,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send {
        async move {
            check_subscriber(&self.users, command.subscriber_id, cancel).await?;
            let event = SubscriptionRejected::new(command.subscriber_id, command.subscribed_to_id);
            self.publisher.publish(event.into(), cancel).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use safelink_domain::event::DomainEvent;
    use safelink_domain::user::User;

    use super::*;
    use crate::test_support::{InMemoryUserStore, RecordingPublisher};

    fn user(name: &str) -> User {
        User::builder()
            .name(name)
            .email(format!("{name}@example.com"))
            .phone_number("+100")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_publish_requested_event() {
        let handler = RequestSubscriptionHandler::new(RecordingPublisher::default());
        let command = RequestSubscription {
            subscriber_id: UserId::new(),
            subscribed_to_id: UserId::new(),
        };

        handler
            .handle(command, &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            &handler.publisher.events()[..],
            [DomainEvent::SubscriptionRequested(e)]
                if e.subscriber_id == command.subscriber_id
                    && e.subscribed_to_id == command.subscribed_to_id
        ));
    }

    #[tokio::test]
    async fn should_publish_approved_without_saving_subscriber() {
        let users = Arc::new(InMemoryUserStore::default());
        let subscriber = users.seed(user("alice"));
        let handler =
            ApproveSubscriptionHandler::new(RecordingPublisher::default(), Arc::clone(&users));

        handler
            .handle(
                ApproveSubscription {
                    subscriber_id: subscriber.id(),
                    subscribed_to_id: UserId::new(),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(matches!(
            &handler.publisher.events()[..],
            [DomainEvent::SubscriptionApproved(_)]
        ));
        assert_eq!(users.get(subscriber.id()).unwrap().version(), 1);
    }

    #[tokio::test]
    async fn should_publish_rejected_even_when_subscriber_unknown() {
        let handler = RejectSubscriptionHandler::new(
            RecordingPublisher::default(),
            InMemoryUserStore::default(),
        );

        handler
            .handle(
                RejectSubscription {
                    subscriber_id: UserId::nil(),
                    subscribed_to_id: UserId::new(),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(matches!(
            &handler.publisher.events()[..],
            [DomainEvent::SubscriptionRejected(e)] if e.subscriber_id.is_nil()
        ));
    }

    #[tokio::test]
    async fn should_not_publish_when_cancelled_before_lookup() {
        let handler = ApproveSubscriptionHandler::new(
            RecordingPublisher::default(),
            InMemoryUserStore::default(),
        );
        let token = CancellationToken::new();
        token.cancel();

        let result = handler
            .handle(
                ApproveSubscription {
                    subscriber_id: UserId::new(),
                    subscribed_to_id: UserId::new(),
                },
                &token,
            )
            .await;

        assert!(matches!(result, Err(SafelinkError::Cancelled)));
        assert!(handler.publisher.events().is_empty());
    }
}

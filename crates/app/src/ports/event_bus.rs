//! Event bus port: publish/subscribe for domain events.

use std::future::Future;
use std::pin::Pin;

use safelink_domain::error::SafelinkError;
use safelink_domain::event::DomainEvent;
use tokio_util::sync::CancellationToken;

/// Boxed future returned by object-safe ports.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Publishes domain events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event and wait until every routed subscriber applied it.
    fn publish(
        &self,
        event: DomainEvent,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: DomainEvent,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send {
        (**self).publish(event, cancel)
    }
}

/// Reacts to published events, usually by mutating and saving an aggregate.
///
/// Object-safe so that heterogeneous subscribers can share one routing table.
pub trait EventSubscriber: Send + Sync {
    /// Stable name, used in logs and to unsubscribe.
    fn name(&self) -> &'static str;

    /// Apply `event`. Events this subscriber does not handle are ignored.
    fn on_event<'a>(
        &'a self,
        event: &'a DomainEvent,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), SafelinkError>>;
}

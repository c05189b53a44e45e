//! In-process event bus with an explicit routing table.
//!
//! Routes are assembled once by the composition root into [`EventRoutes`]
//! and handed to [`InProcessEventBus::new`] by value; nothing is registered
//! globally. Publishing awaits every routed subscriber in registration order,
//! so by the time `publish` returns the event has been applied.
//!
//! A route is either a subscriber, whose failure fails the publish, or a
//! follower. Followers run after every subscriber succeeded; their failures
//! are logged and never reach the publisher.
//!
//! Observers that only want to watch the stream (logging, tests, live
//! views) use [`InProcessEventBus::observe`], backed by a tokio
//! [`broadcast`] channel.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use safelink_domain::error::SafelinkError;
use safelink_domain::event::{DomainEvent, EventType};

use crate::ports::{EventPublisher, EventSubscriber};

/// Event type → ordered subscribers and followers.
#[derive(Default, Clone)]
pub struct EventRoutes {
    subscribers: HashMap<EventType, Vec<Arc<dyn EventSubscriber>>>,
    followers: HashMap<EventType, Vec<Arc<dyn EventSubscriber>>>,
}

impl EventRoutes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `event_type` to `subscriber`, after any already routed ones.
    pub fn subscribe(
        &mut self,
        event_type: EventType,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> &mut Self {
        self.subscribers
            .entry(event_type)
            .or_default()
            .push(subscriber);
        self
    }

    /// Route `event_type` to `follower` on a best-effort basis.
    ///
    /// Followers run after all subscribers, in registration order.
    pub fn follow(
        &mut self,
        event_type: EventType,
        follower: Arc<dyn EventSubscriber>,
    ) -> &mut Self {
        self.followers.entry(event_type).or_default().push(follower);
        self
    }

    /// Remove the subscriber or follower named `name` from `event_type`.
    ///
    /// Returns whether a route was removed.
    pub fn unsubscribe(&mut self, event_type: EventType, name: &str) -> bool {
        let mut removed = false;
        for routes in [&mut self.subscribers, &mut self.followers] {
            if let Some(list) = routes.get_mut(&event_type) {
                let before = list.len();
                list.retain(|s| s.name() != name);
                removed |= before != list.len();
            }
        }
        removed
    }

    /// Names of everything routed for `event_type`, in dispatch order.
    #[must_use]
    pub fn subscriber_names(&self, event_type: EventType) -> Vec<&'static str> {
        self.subscribers_for(event_type)
            .iter()
            .chain(self.followers_for(event_type))
            .map(|s| s.name())
            .collect()
    }

    fn subscribers_for(&self, event_type: EventType) -> &[Arc<dyn EventSubscriber>] {
        match self.subscribers.get(&event_type) {
            Some(routes) => routes,
            None => &[],
        }
    }

    fn followers_for(&self, event_type: EventType) -> &[Arc<dyn EventSubscriber>] {
        match self.followers.get(&event_type) {
            Some(routes) => routes,
            None => &[],
        }
    }
}

impl std::fmt::Debug for EventRoutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for event_type in EventType::ALL {
            let names = self.subscriber_names(event_type);
            if !names.is_empty() {
                map.entry(&event_type, &names);
            }
        }
        map.finish()
    }
}

/// Direct-dispatch event bus.
///
/// Publishing with no routed subscriber and no observer succeeds.
pub struct InProcessEventBus {
    routes: EventRoutes,
    observers: broadcast::Sender<DomainEvent>,
}

impl InProcessEventBus {
    /// Create a bus from a finished routing table.
    ///
    /// `capacity` bounds the observer channel; slow observers lag and skip
    /// events rather than block publishers.
    #[must_use]
    pub fn new(routes: EventRoutes, capacity: usize) -> Self {
        let (observers, _) = broadcast::channel(capacity);
        Self { routes, observers }
    }

    /// Watch every successfully dispatched event.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the call.
    #[must_use]
    pub fn observe(&self) -> broadcast::Receiver<DomainEvent> {
        self.observers.subscribe()
    }

    async fn dispatch(
        &self,
        event: DomainEvent,
        cancel: &CancellationToken,
    ) -> Result<(), SafelinkError> {
        if cancel.is_cancelled() {
            return Err(SafelinkError::Cancelled);
        }

        let event_type = event.event_type();
        for subscriber in self.routes.subscribers_for(event_type) {
            tracing::debug!(
                %event_type,
                event_id = %event.event_id(),
                subscriber = subscriber.name(),
                "dispatching event"
            );
            if let Err(err) = subscriber.on_event(&event, cancel).await {
                tracing::warn!(
                    %err,
                    %event_type,
                    subscriber = subscriber.name(),
                    "subscriber failed to apply event"
                );
                return Err(err);
            }
        }

        for follower in self.routes.followers_for(event_type) {
            if let Err(err) = follower.on_event(&event, cancel).await {
                tracing::warn!(
                    %err,
                    %event_type,
                    follower = follower.name(),
                    "follower failed to apply event, continuing"
                );
            }
        }

        // send fails only when nobody observes, which is fine.
        let _ = self.observers.send(event);
        Ok(())
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(
        &self,
        event: DomainEvent,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send {
        self.dispatch(event, cancel)
    }
}

//! Standard routing table: which subscriber handles which event.

use std::sync::Arc;

use safelink_domain::emergency::ResolutionPolicy;
use safelink_domain::event::EventType;

use crate::event_bus::EventRoutes;
use crate::ports::{EmergencyStore, UserStore};
use crate::subscribers::{
    EmergencyEventSubscriber, StatusBroadcastSubscriber, SubscriptionEventSubscriber,
};

/// Build the routes used by the daemon.
///
/// `UserStatusMarked` goes to the emergency subscriber; the status broadcast
/// follows it, so a failed cache update never fails a stored check-in.
pub fn routes<E, U>(emergencies: E, users: U, policy: Arc<dyn ResolutionPolicy>) -> EventRoutes
where
    E: EmergencyStore + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
{
    let emergency = Arc::new(EmergencyEventSubscriber::with_policy(emergencies, policy));
    let subscription = Arc::new(SubscriptionEventSubscriber::new(users.clone()));
    let broadcast = Arc::new(StatusBroadcastSubscriber::new(users));

    let mut routes = EventRoutes::new();
    routes
        .subscribe(EventType::EmergencyStarted, emergency.clone())
        .subscribe(EventType::EmergencyEnded, emergency.clone())
        .subscribe(EventType::UserStatusMarked, emergency)
        .subscribe(EventType::SubscriptionRequested, subscription.clone())
        .subscribe(EventType::SubscriptionApproved, subscription.clone())
        .subscribe(EventType::SubscriptionRejected, subscription)
        .follow(EventType::UserStatusMarked, broadcast);
    routes
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use safelink_domain::emergency::{EmergencyStatus, EmergencyType, NeverAutoResolve};
    use safelink_domain::event::{DomainEvent, EmergencyEnded, EmergencyStarted, UserStatusMarked};
    use safelink_domain::id::{EmergencyId, UserId};
    use safelink_domain::location::Location;
    use safelink_domain::user::{SubscriptionStatus, User, UserStatus};

    use super::*;
    use crate::commands::{ApproveSubscription, MarkUserStatus, RequestSubscription};
    use crate::event_bus::InProcessEventBus;
    use crate::handlers::{CommandHandler, Handlers};
    use crate::ports::EventPublisher;
    use crate::test_support::{InMemoryEmergencyStore, InMemoryUserStore};

    struct Harness {
        emergencies: Arc<InMemoryEmergencyStore>,
        users: Arc<InMemoryUserStore>,
        bus: Arc<InProcessEventBus>,
        handlers: Handlers<Arc<InProcessEventBus>, Arc<InMemoryUserStore>>,
    }

    fn harness() -> Harness {
        let emergencies = Arc::new(InMemoryEmergencyStore::default());
        let users = Arc::new(InMemoryUserStore::default());
        let routes = routes(
            Arc::clone(&emergencies),
            Arc::clone(&users),
            Arc::new(NeverAutoResolve),
        );
        let bus = Arc::new(InProcessEventBus::new(routes, 16));
        let handlers = Handlers::new(Arc::clone(&bus), Arc::clone(&users));
        Harness {
            emergencies,
            users,
            bus,
            handlers,
        }
    }

    fn user(name: &str) -> User {
        User::builder()
            .name(name)
            .email(format!("{name}@example.com"))
            .phone_number("+100")
            .build()
            .unwrap()
    }

    async fn publish(h: &Harness, event: impl Into<DomainEvent>) {
        h.bus
            .publish(event.into(), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[test]
    fn should_route_status_to_emergency_then_broadcast() {
        let h = harness();
        let routes = routes(h.emergencies, h.users, Arc::new(NeverAutoResolve));
        assert_eq!(
            routes.subscriber_names(EventType::UserStatusMarked),
            vec!["emergency", "status_broadcast"]
        );
        for ty in EventType::ALL {
            assert!(!routes.subscriber_names(ty).is_empty(), "{ty} unrouted");
        }
    }

    #[tokio::test]
    async fn should_store_active_emergency_with_default_area_when_started() {
        let h = harness();
        let e1 = EmergencyId::new();

        publish(
            &h,
            EmergencyStarted::new(e1, UserId::new(), Location::new(32.08, 34.78, ""))
                .with_type(Some(EmergencyType::WeatherAlert)),
        )
        .await;

        let stored = h.emergencies.get(e1).unwrap();
        assert_eq!(stored.status(), EmergencyStatus::Active);
        assert_eq!(stored.affected_areas().len(), 1);
        assert!((stored.affected_areas()[0].radius_in_meters() - 500.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_store_response_when_status_marked() {
        let h = harness();
        let e1 = EmergencyId::new();
        let u1 = UserId::new();
        publish(&h, EmergencyStarted::new(e1, UserId::new(), Location::new(32.08, 34.78, ""))).await;

        publish(&h, UserStatusMarked::new(u1, e1, UserStatus::Safe, "ok")).await;

        let stored = h.emergencies.get(e1).unwrap();
        assert_eq!(stored.responses().len(), 1);
        assert!(stored.responses()[0].is_safe);
        assert_eq!(stored.responses()[0].message, "ok");
    }

    #[tokio::test]
    async fn should_resolve_when_ended() {
        let h = harness();
        let e1 = EmergencyId::new();
        publish(&h, EmergencyStarted::new(e1, UserId::new(), Location::new(32.08, 34.78, ""))).await;

        publish(&h, EmergencyEnded::new(e1, None)).await;

        let stored = h.emergencies.get(e1).unwrap();
        assert_eq!(stored.status(), EmergencyStatus::Resolved);
        assert!(stored.resolved_at().is_some());
    }

    #[tokio::test]
    async fn should_neither_create_nor_fail_when_ending_unknown_emergency() {
        let h = harness();

        publish(&h, EmergencyEnded::new(EmergencyId::new(), None)).await;

        assert_eq!(h.emergencies.count(), 0);
    }

    #[tokio::test]
    async fn should_approve_subscription_through_handlers() {
        let h = harness();
        let a = h.users.seed(user("a")).id();
        let b = h.users.seed(user("b")).id();
        let token = CancellationToken::new();

        h.handlers
            .request_subscription
            .handle(
                RequestSubscription {
                    subscriber_id: a,
                    subscribed_to_id: b,
                },
                &token,
            )
            .await
            .unwrap();
        let pending = h.users.get(b).unwrap();
        assert_eq!(
            pending.subscription_from(a).unwrap().status(),
            SubscriptionStatus::Pending
        );

        h.handlers
            .approve_subscription
            .handle(
                ApproveSubscription {
                    subscriber_id: a,
                    subscribed_to_id: b,
                },
                &token,
            )
            .await
            .unwrap();

        let approved = h.users.get(b).unwrap();
        let subscription = approved.subscription_from(a).unwrap();
        assert_eq!(subscription.status(), SubscriptionStatus::Approved);
        assert!(subscription.approved_at().is_some());
    }

    #[tokio::test]
    async fn should_cache_status_for_followers_when_marked() {
        let h = harness();
        let a = h.users.seed(user("a")).id();
        let mut b = user("b");
        b.set_requires_approval(false);
        let b = h.users.seed(b).id();
        let token = CancellationToken::new();
        h.handlers
            .request_subscription
            .handle(
                RequestSubscription {
                    subscriber_id: a,
                    subscribed_to_id: b,
                },
                &token,
            )
            .await
            .unwrap();

        h.handlers
            .mark_user_status
            .handle(
                MarkUserStatus {
                    user_id: b,
                    emergency_id: EmergencyId::new(),
                    status: UserStatus::HelpNeeded,
                    message: String::new(),
                },
                &token,
            )
            .await
            .unwrap();

        let subscriptions = h.users.subscriptions_of(a).await.unwrap();
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(
            subscriptions[0].last_known_status(),
            Some(UserStatus::HelpNeeded)
        );
    }

    #[tokio::test]
    async fn should_report_check_in_once_when_status_cache_cannot_be_saved() {
        let h = harness();
        let follower = h.users.seed(user("follower")).id();
        let mut marker = user("marker");
        marker.set_requires_approval(false);
        let marker = h.users.seed(marker).id();
        let token = CancellationToken::new();
        h.handlers
            .request_subscription
            .handle(
                RequestSubscription {
                    subscriber_id: follower,
                    subscribed_to_id: marker,
                },
                &token,
            )
            .await
            .unwrap();
        let e1 = EmergencyId::new();
        publish(&h, EmergencyStarted::new(e1, UserId::new(), Location::new(0.0, 0.0, ""))).await;
        h.users.fail_saves();

        let result = h
            .handlers
            .mark_user_status
            .handle(
                MarkUserStatus {
                    user_id: marker,
                    emergency_id: e1,
                    status: UserStatus::Safe,
                    message: "ok".to_string(),
                },
                &token,
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(h.emergencies.get(e1).unwrap().responses().len(), 1);
        let subscriptions = h.users.subscriptions_of(follower).await.unwrap();
        assert_eq!(subscriptions[0].last_known_status(), None);
    }

    #[tokio::test]
    async fn should_surface_conflict_when_stale_copy_saved() {
        let h = harness();
        let e1 = EmergencyId::new();
        publish(&h, EmergencyStarted::new(e1, UserId::new(), Location::new(0.0, 0.0, ""))).await;
        let stale = h.emergencies.get(e1).unwrap();

        publish(&h, UserStatusMarked::new(UserId::new(), e1, UserStatus::Safe, "")).await;
        let result = crate::ports::EmergencyStore::save(&h.emergencies, stale).await;

        assert!(matches!(
            result,
            Err(safelink_domain::error::SafelinkError::Conflict(_))
        ));
        assert_eq!(h.emergencies.get(e1).unwrap().responses().len(), 1);
    }
}

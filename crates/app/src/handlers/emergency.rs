//! Emergency command handlers.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use safelink_domain::error::SafelinkError;
use safelink_domain::event::{EmergencyEnded, EmergencyStarted, UserStatusMarked};
use safelink_domain::id::EmergencyId;

use super::CommandHandler;
use crate::commands::{EndEmergency, MarkUserStatus, StartEmergency};
use crate::ports::EventPublisher;

/// Generates the emergency id and publishes `EmergencyStarted`.
pub struct StartEmergencyHandler<P> {
    publisher: P,
}

impl<P> StartEmergencyHandler<P> {
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }
}

impl<P: EventPublisher + Send + Sync> CommandHandler<StartEmergency> for StartEmergencyHandler<P> {
    type Output = EmergencyId;

    fn handle(
        &self,
        command: StartEmergency,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<EmergencyId, SafelinkError>> + Send {
        async move {
            let emergency_id = EmergencyId::new();
            let event = EmergencyStarted::new(
                emergency_id,
                command.initiator_user_id,
                command.location,
            )
            .with_type(command.emergency_type)
            .with_areas(command.affected_areas)
            .with_severity(command.severity)
            .with_description(command.description)
            .with_attachments(command.attachments);

            tracing::info!(
                %emergency_id,
                initiator_id = %command.initiator_user_id,
                severity = %command.severity,
                "starting emergency"
            );
            self.publisher.publish(event.into(), cancel).await?;
            Ok(emergency_id)
        }
    }
}

/// Publishes `EmergencyEnded` without checking that the emergency exists.
pub struct EndEmergencyHandler<P> {
    publisher: P,
}

impl<P> EndEmergencyHandler<P> {
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }
}

impl<P: EventPublisher + Send + Sync> CommandHandler<EndEmergency> for EndEmergencyHandler<P> {
    type Output = ();

    fn handle(
        &self,
        command: EndEmergency,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send {
        let event = EmergencyEnded::new(command.emergency_id, command.resolution_note);
        tracing::debug!(emergency_id = %command.emergency_id, "ending emergency");
        self.publisher.publish(event.into(), cancel)
    }
}

/// Publishes `UserStatusMarked`.
pub struct MarkUserStatusHandler<P> {
    publisher: P,
}

impl<P> MarkUserStatusHandler<P> {
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }
}

impl<P: EventPublisher + Send + Sync> CommandHandler<MarkUserStatus> for MarkUserStatusHandler<P> {
    type Output = ();

    fn handle(
        &self,
        command: MarkUserStatus,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send {
        let event = UserStatusMarked::new(
            command.user_id,
            command.emergency_id,
            command.status,
            command.message,
        );
        tracing::debug!(
            user_id = %command.user_id,
            emergency_id = %command.emergency_id,
            status = %command.status,
            "marking user status"
        );
        self.publisher.publish(event.into(), cancel)
    }
}

#[cfg(test)]
mod tests {
    use safelink_domain::emergency::{EmergencyType, Severity};
    use safelink_domain::event::DomainEvent;
    use safelink_domain::id::UserId;
    use safelink_domain::location::Location;
    use safelink_domain::user::UserStatus;

    use super::*;
    use crate::test_support::RecordingPublisher;

    #[tokio::test]
    async fn should_publish_started_event_with_generated_id() {
        let handler = StartEmergencyHandler::new(RecordingPublisher::default());
        let initiator = UserId::new();
        let mut command = StartEmergency::new(initiator, Location::new(32.08, 34.78, "TLV"))
            .with_type(EmergencyType::WeatherAlert);
        command.severity = Severity::High;
        command.description = "storm".to_string();

        let id = handler
            .handle(command, &CancellationToken::new())
            .await
            .unwrap();

        let events = handler.publisher.events();
        assert_eq!(events.len(), 1);
        let DomainEvent::EmergencyStarted(started) = &events[0] else {
            panic!("wrong variant");
        };
        assert_eq!(started.emergency_id, id);
        assert_eq!(started.initiator_user_id, initiator);
        assert_eq!(started.emergency_type, Some(EmergencyType::WeatherAlert));
        assert_eq!(started.severity, Severity::High);
        assert_eq!(started.description, "storm");
        assert!(started.location.is_some());
    }

    #[tokio::test]
    async fn should_generate_distinct_ids_per_start() {
        let handler = StartEmergencyHandler::new(RecordingPublisher::default());
        let command = StartEmergency::new(UserId::new(), Location::new(0.0, 0.0, ""));
        let token = CancellationToken::new();

        let a = handler.handle(command.clone(), &token).await.unwrap();
        let b = handler.handle(command, &token).await.unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn should_publish_ended_event_even_for_unknown_emergency() {
        let handler = EndEmergencyHandler::new(RecordingPublisher::default());
        let command = EndEmergency {
            emergency_id: EmergencyId::nil(),
            resolution_note: Some("false alarm".to_string()),
        };

        handler
            .handle(command, &CancellationToken::new())
            .await
            .unwrap();

        let events = handler.publisher.events();
        assert!(matches!(
            &events[..],
            [DomainEvent::EmergencyEnded(e)] if e.emergency_id.is_nil()
                && e.resolution_note.as_deref() == Some("false alarm")
        ));
    }

    #[tokio::test]
    async fn should_publish_status_marked_event() {
        let handler = MarkUserStatusHandler::new(RecordingPublisher::default());
        let command = MarkUserStatus {
            user_id: UserId::new(),
            emergency_id: EmergencyId::new(),
            status: UserStatus::HelpNeeded,
            message: "trapped".to_string(),
        };

        handler
            .handle(command.clone(), &CancellationToken::new())
            .await
            .unwrap();

        let events = handler.publisher.events();
        let DomainEvent::UserStatusMarked(marked) = &events[0] else {
            panic!("wrong variant");
        };
        assert_eq!(marked.user_id, command.user_id);
        assert_eq!(marked.status, UserStatus::HelpNeeded);
        assert_eq!(marked.message, "trapped");
    }

    #[tokio::test]
    async fn should_fail_with_cancelled_when_token_fired() {
        let handler = EndEmergencyHandler::new(RecordingPublisher::default());
        let token = CancellationToken::new();
        token.cancel();

        let result = handler
            .handle(
                EndEmergency {
                    emergency_id: EmergencyId::new(),
                    resolution_note: None,
                },
                &token,
            )
            .await;

        assert!(matches!(result, Err(SafelinkError::Cancelled)));
        assert!(handler.publisher.events().is_empty());
    }
}

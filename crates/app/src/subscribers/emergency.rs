//! Applies emergency events to the [`Emergency`] aggregate.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use safelink_domain::emergency::{Emergency, NeverAutoResolve, ResolutionPolicy};
use safelink_domain::error::SafelinkError;
use safelink_domain::event::{DomainEvent, EmergencyEnded, EmergencyStarted, UserStatusMarked};

use crate::cancellation::cancellable;
use crate::ports::{BoxFuture, EmergencyStore, EventSubscriber};

/// Handles `EmergencyStarted`, `EmergencyEnded` and `UserStatusMarked`.
///
/// This is the only place an [`Emergency`] is created.
pub struct EmergencyEventSubscriber<S> {
    store: S,
    policy: Arc<dyn ResolutionPolicy>,
}

impl<S> EmergencyEventSubscriber<S> {
    /// Subscriber that never resolves an emergency on its own.
    pub fn new(store: S) -> Self {
        Self::with_policy(store, Arc::new(NeverAutoResolve))
    }

    /// Subscriber consulting `policy` after each recorded response.
    pub fn with_policy(store: S, policy: Arc<dyn ResolutionPolicy>) -> Self {
        Self { store, policy }
    }
}

impl<S: EmergencyStore + Send + Sync> EmergencyEventSubscriber<S> {
    #[tracing::instrument(skip_all, fields(emergency_id = %event.emergency_id))]
    async fn on_started(
        &self,
        event: &EmergencyStarted,
        cancel: &CancellationToken,
    ) -> Result<(), SafelinkError> {
        if cancellable(cancel, self.store.get_by_id(event.emergency_id))
            .await?
            .is_some()
        {
            tracing::debug!("emergency already exists, ignoring duplicate start");
            return Ok(());
        }

        let mut builder = Emergency::builder()
            .id(event.emergency_id)
            .initiator_id(event.initiator_user_id)
            .affected_areas(event.affected_areas.iter().cloned())
            .severity(event.severity)
            .description(event.description.clone());
        if let Some(location) = &event.location {
            builder = builder.location(location.clone());
        }
        if let Some(emergency_type) = event.emergency_type {
            builder = builder.emergency_type(emergency_type);
        }
        let emergency = builder.build()?;

        let stored = cancellable(cancel, self.store.add(emergency)).await?;
        tracing::info!(
            severity = %stored.severity(),
            areas = stored.affected_areas().len(),
            "emergency created"
        );
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(emergency_id = %event.emergency_id))]
    async fn on_ended(
        &self,
        event: &EmergencyEnded,
        cancel: &CancellationToken,
    ) -> Result<(), SafelinkError> {
        let Some(mut emergency) =
            cancellable(cancel, self.store.get_by_id(event.emergency_id)).await?
        else {
            tracing::debug!("emergency not found, ignoring end");
            return Ok(());
        };

        if !emergency.resolve_with_note(event.resolution_note.clone()) {
            tracing::debug!("emergency already resolved");
            return Ok(());
        }
        cancellable(cancel, self.store.save(emergency)).await?;
        tracing::info!("emergency resolved");
        Ok(())
    }

    #[tracing::instrument(
        skip_all,
        fields(emergency_id = %event.emergency_id, user_id = %event.user_id)
    )]
    async fn on_status_marked(
        &self,
        event: &UserStatusMarked,
        cancel: &CancellationToken,
    ) -> Result<(), SafelinkError> {
        let Some(mut emergency) =
            cancellable(cancel, self.store.get_by_id(event.emergency_id)).await?
        else {
            tracing::debug!("emergency not found, ignoring status");
            return Ok(());
        };

        emergency.add_response(
            event.user_id,
            event.status.is_safe(),
            Some(event.message.clone()),
        );
        let resolved = emergency.apply_policy(self.policy.as_ref());

        cancellable(cancel, self.store.save(emergency)).await?;
        tracing::info!(status = %event.status, "response recorded");
        if resolved {
            tracing::info!("emergency resolved by policy");
        }
        Ok(())
    }
}

impl<S: EmergencyStore + Send + Sync> EventSubscriber for EmergencyEventSubscriber<S> {
    fn name(&self) -> &'static str {
        "emergency"
    }

    fn on_event<'a>(
        &'a self,
        event: &'a DomainEvent,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), SafelinkError>> {
        Box::pin(async move {
            match event {
                DomainEvent::EmergencyStarted(e) => self.on_started(e, cancel).await,
                DomainEvent::EmergencyEnded(e) => self.on_ended(e, cancel).await,
                DomainEvent::UserStatusMarked(e) => self.on_status_marked(e, cancel).await,
                _ => Ok(()),
            }
        })
    }
}

//! Emergency: the aggregate tracking one declared emergency and its check-ins.
//!
//! An emergency starts [`Active`](EmergencyStatus::Active) and moves to
//! [`Resolved`](EmergencyStatus::Resolved) exactly once. Responses are
//! append-only. `resolved_at` is set if and only if the status is resolved.

mod attachments;
mod kind;
mod resolution;
mod response;

pub use attachments::{ContactMethods, EmergencyAttachments};
pub use kind::{EmergencyStatus, EmergencyType, Severity};
pub use resolution::{ExpectedResponders, NeverAutoResolve, ResolutionPolicy};
pub use response::EmergencyResponse;

use serde::Serialize;

use crate::area::Area;
use crate::error::ValidationError;
use crate::id::{EmergencyId, UserId};
use crate::location::Location;
use crate::time::{Timestamp, now};

/// Aggregate root for a single emergency.
///
/// Fields are private so that the status/`resolved_at` pairing and the
/// append-only response log cannot be broken from outside.
#[derive(Debug, Clone, Serialize)]
pub struct Emergency {
    id: EmergencyId,
    initiator_id: UserId,
    location: Location,
    affected_areas: Vec<Area>,
    severity: Severity,
    emergency_type: Option<EmergencyType>,
    description: String,
    status: EmergencyStatus,
    created_at: Timestamp,
    resolved_at: Option<Timestamp>,
    resolution_note: Option<String>,
    responses: Vec<EmergencyResponse>,
    version: u64,
}

impl Emergency {
    /// Create a builder for constructing an [`Emergency`].
    #[must_use]
    pub fn builder() -> EmergencyBuilder {
        EmergencyBuilder::default()
    }

    #[must_use]
    pub fn id(&self) -> EmergencyId {
        self.id
    }

    #[must_use]
    pub fn initiator_id(&self) -> UserId {
        self.initiator_id
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn affected_areas(&self) -> &[Area] {
        &self.affected_areas
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn emergency_type(&self) -> Option<EmergencyType> {
        self.emergency_type
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn status(&self) -> EmergencyStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EmergencyStatus::Active
    }

    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[must_use]
    pub fn resolved_at(&self) -> Option<Timestamp> {
        self.resolved_at
    }

    #[must_use]
    pub fn resolution_note(&self) -> Option<&str> {
        self.resolution_note.as_deref()
    }

    #[must_use]
    pub fn responses(&self) -> &[EmergencyResponse] {
        &self.responses
    }

    /// Optimistic-concurrency marker; `0` until first persisted.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Set by stores after a successful write.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Whether `user_id` has checked in at least once.
    #[must_use]
    pub fn has_response_from(&self, user_id: UserId) -> bool {
        self.responses.iter().any(|r| r.user_id == user_id)
    }

    /// Most recent response from `user_id`, if any.
    #[must_use]
    pub fn latest_response_of(&self, user_id: UserId) -> Option<&EmergencyResponse> {
        self.responses.iter().rev().find(|r| r.user_id == user_id)
    }

    /// Append a check-in. A missing message is stored as `""`.
    ///
    /// Responses are accepted in any status; this never changes the status
    /// by itself (see [`apply_policy`](Self::apply_policy)).
    pub fn add_response(
        &mut self,
        user_id: UserId,
        is_safe: bool,
        message: Option<String>,
    ) -> &EmergencyResponse {
        self.responses.push(EmergencyResponse::new(
            user_id,
            is_safe,
            message.unwrap_or_default(),
        ));
        &self.responses[self.responses.len() - 1]
    }

    /// Resolve the emergency. Returns `false` if it was already resolved,
    /// in which case nothing changes.
    pub fn resolve(&mut self) -> bool {
        self.resolve_with_note(None)
    }

    /// Resolve and keep an optional note. Only the first resolution sticks.
    pub fn resolve_with_note(&mut self, note: Option<String>) -> bool {
        if self.status == EmergencyStatus::Resolved {
            return false;
        }
        self.status = EmergencyStatus::Resolved;
        self.resolved_at = Some(now());
        self.resolution_note = note.filter(|n| !n.trim().is_empty());
        true
    }

    /// Resolve when `policy` says every expected responder has checked in.
    pub fn apply_policy<P>(&mut self, policy: &P) -> bool
    where
        P: ResolutionPolicy + ?Sized,
    {
        self.is_active() && policy.should_resolve(self) && self.resolve()
    }
}

/// Step-by-step builder for [`Emergency`].
///
/// Besides the creation path, stores use the `created_at`, `resolved`,
/// `responses` and `version` setters to rehydrate persisted state.
#[derive(Debug, Default)]
pub struct EmergencyBuilder {
    id: Option<EmergencyId>,
    initiator_id: Option<UserId>,
    location: Option<Location>,
    affected_areas: Vec<Area>,
    severity: Severity,
    emergency_type: Option<EmergencyType>,
    description: String,
    created_at: Option<Timestamp>,
    resolved: Option<(Timestamp, Option<String>)>,
    responses: Vec<EmergencyResponse>,
    version: u64,
}

impl EmergencyBuilder {
    #[must_use]
    pub fn id(mut self, id: EmergencyId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn initiator_id(mut self, user_id: UserId) -> Self {
        self.initiator_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn affected_areas(mut self, areas: impl IntoIterator<Item = Area>) -> Self {
        self.affected_areas.extend(areas);
        self
    }

    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn emergency_type(mut self, emergency_type: EmergencyType) -> Self {
        self.emergency_type = Some(emergency_type);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Mark as already resolved at `resolved_at`.
    #[must_use]
    pub fn resolved(mut self, resolved_at: Timestamp, note: Option<String>) -> Self {
        self.resolved = Some((resolved_at, note));
        self
    }

    #[must_use]
    pub fn responses(mut self, responses: impl IntoIterator<Item = EmergencyResponse>) -> Self {
        self.responses.extend(responses);
        self
    }

    #[must_use]
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Consume the builder, validate, and return an [`Emergency`].
    ///
    /// When no affected area was supplied, a single area is derived from the
    /// location and emergency type.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingLocation`] if no location was set.
    pub fn build(self) -> Result<Emergency, ValidationError> {
        let location = self.location.ok_or(ValidationError::MissingLocation)?;
        let affected_areas = if self.affected_areas.is_empty() {
            vec![Area::from_location(
                location.clone(),
                None,
                self.emergency_type,
            )]
        } else {
            self.affected_areas
        };
        let (status, resolved_at, resolution_note) = match self.resolved {
            Some((at, note)) => (EmergencyStatus::Resolved, Some(at), note),
            None => (EmergencyStatus::Active, None, None),
        };

        Ok(Emergency {
            id: self.id.unwrap_or_default(),
            initiator_id: self.initiator_id.unwrap_or(UserId::nil()),
            location,
            affected_areas,
            severity: self.severity,
            emergency_type: self.emergency_type,
            description: self.description,
            status,
            created_at: self.created_at.unwrap_or_else(now),
            resolved_at,
            resolution_note,
            responses: self.responses,
            version: self.version,
        })
    }
}

//! Domain events: immutable records of something that happened.
//!
//! Command handlers publish exactly one [`DomainEvent`] per command;
//! subscribers consume them and mutate aggregates. [`EventType`] is the
//! field-less discriminant used to route events.
//!
//! On the wire an event is internally tagged JSON:
//!
//! ```json
//! { "type": "emergency_ended", "emergency_id": "…", "occurred_at": "…" }
//! ```
//!
//! Older shapes are upgraded by [`EventEnvelope::decode`].

mod legacy;

pub use legacy::{EventDecodeError, EventEnvelope};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::area::Area;
use crate::emergency::{EmergencyAttachments, EmergencyType, Severity};
use crate::error::ValidationError;
use crate::id::{EmergencyId, EventId, UserId};
use crate::location::Location;
use crate::time::{Timestamp, now};
use crate::user::UserStatus;

/// Routing key for a [`DomainEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    EmergencyStarted,
    EmergencyEnded,
    UserStatusMarked,
    SubscriptionRequested,
    SubscriptionApproved,
    SubscriptionRejected,
}

impl EventType {
    pub const ALL: [Self; 6] = [
        Self::EmergencyStarted,
        Self::EmergencyEnded,
        Self::UserStatusMarked,
        Self::SubscriptionRequested,
        Self::SubscriptionApproved,
        Self::SubscriptionRejected,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmergencyStarted => "emergency_started",
            Self::EmergencyEnded => "emergency_ended",
            Self::UserStatusMarked => "user_status_marked",
            Self::SubscriptionRequested => "subscription_requested",
            Self::SubscriptionApproved => "subscription_approved",
            Self::SubscriptionRejected => "subscription_rejected",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownValue(format!("event type {s}")))
    }
}

/// An emergency was declared.
///
/// `location` is optional on the wire so that a malformed external event
/// surfaces as [`ValidationError::MissingLocation`] when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyStarted {
    #[serde(default)]
    pub event_id: EventId,
    #[serde(default = "now")]
    pub occurred_at: Timestamp,
    pub emergency_id: EmergencyId,
    pub initiator_user_id: UserId,
    #[serde(default)]
    pub emergency_type: Option<EmergencyType>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub affected_areas: Vec<Area>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attachments: Option<EmergencyAttachments>,
}

impl EmergencyStarted {
    #[must_use]
    pub fn new(emergency_id: EmergencyId, initiator_user_id: UserId, location: Location) -> Self {
        Self {
            event_id: EventId::new(),
            occurred_at: now(),
            emergency_id,
            initiator_user_id,
            emergency_type: None,
            location: Some(location),
            affected_areas: Vec::new(),
            severity: Severity::default(),
            description: String::new(),
            attachments: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, emergency_type: Option<EmergencyType>) -> Self {
        self.emergency_type = emergency_type;
        self
    }

    #[must_use]
    pub fn with_areas(mut self, areas: Vec<Area>) -> Self {
        self.affected_areas = areas;
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Option<EmergencyAttachments>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// An emergency was declared over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyEnded {
    #[serde(default)]
    pub event_id: EventId,
    #[serde(default = "now")]
    pub occurred_at: Timestamp,
    pub emergency_id: EmergencyId,
    #[serde(default)]
    pub resolution_note: Option<String>,
}

impl EmergencyEnded {
    #[must_use]
    pub fn new(emergency_id: EmergencyId, resolution_note: Option<String>) -> Self {
        Self {
            event_id: EventId::new(),
            occurred_at: now(),
            emergency_id,
            resolution_note,
        }
    }
}

/// A user reported their status for an emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatusMarked {
    #[serde(default)]
    pub event_id: EventId,
    #[serde(default = "now")]
    pub occurred_at: Timestamp,
    pub user_id: UserId,
    pub emergency_id: EmergencyId,
    pub status: UserStatus,
    #[serde(default)]
    pub message: String,
}

impl UserStatusMarked {
    #[must_use]
    pub fn new(
        user_id: UserId,
        emergency_id: EmergencyId,
        status: UserStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            occurred_at: now(),
            user_id,
            emergency_id,
            status,
            message: message.into(),
        }
    }
}

macro_rules! subscription_event {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default)]
            pub event_id: EventId,
            #[serde(default = "now")]
            pub occurred_at: Timestamp,
            pub subscriber_id: UserId,
            pub subscribed_to_id: UserId,
        }

        impl $name {
            #[must_use]
            pub fn new(subscriber_id: UserId, subscribed_to_id: UserId) -> Self {
                Self {
                    event_id: EventId::new(),
                    occurred_at: now(),
                    subscriber_id,
                    subscribed_to_id,
                }
            }
        }
    };
}

subscription_event!(
    /// `subscriber_id` asked to follow `subscribed_to_id`.
    SubscriptionRequested
);

subscription_event!(
    /// `subscribed_to_id` accepted a pending request.
    SubscriptionApproved
);

subscription_event!(
    /// `subscribed_to_id` declined a pending request.
    SubscriptionRejected
);

/// Every event the system publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    EmergencyStarted(EmergencyStarted),
    EmergencyEnded(EmergencyEnded),
    UserStatusMarked(UserStatusMarked),
    SubscriptionRequested(SubscriptionRequested),
    SubscriptionApproved(SubscriptionApproved),
    SubscriptionRejected(SubscriptionRejected),
}

impl DomainEvent {
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::EmergencyStarted(_) => EventType::EmergencyStarted,
            Self::EmergencyEnded(_) => EventType::EmergencyEnded,
            Self::UserStatusMarked(_) => EventType::UserStatusMarked,
            Self::SubscriptionRequested(_) => EventType::SubscriptionRequested,
            Self::SubscriptionApproved(_) => EventType::SubscriptionApproved,
            Self::SubscriptionRejected(_) => EventType::SubscriptionRejected,
        }
    }

    #[must_use]
    pub fn event_id(&self) -> EventId {
        match self {
            Self::EmergencyStarted(e) => e.event_id,
            Self::EmergencyEnded(e) => e.event_id,
            Self::UserStatusMarked(e) => e.event_id,
            Self::SubscriptionRequested(e) => e.event_id,
            Self::SubscriptionApproved(e) => e.event_id,
            Self::SubscriptionRejected(e) => e.event_id,
        }
    }

    #[must_use]
    pub fn occurred_at(&self) -> Timestamp {
        match self {
            Self::EmergencyStarted(e) => e.occurred_at,
            Self::EmergencyEnded(e) => e.occurred_at,
            Self::UserStatusMarked(e) => e.occurred_at,
            Self::SubscriptionRequested(e) => e.occurred_at,
            Self::SubscriptionApproved(e) => e.occurred_at,
            Self::SubscriptionRejected(e) => e.occurred_at,
        }
    }
}

macro_rules! impl_from_payload {
    ($($name:ident),* $(,)?) => {
        $(
            impl From<$name> for DomainEvent {
                fn from(event: $name) -> Self {
                    Self::$name(event)
                }
            }
        )*
    };
}

impl_from_payload!(
    EmergencyStarted,
    EmergencyEnded,
    UserStatusMarked,
    SubscriptionRequested,
    SubscriptionApproved,
    SubscriptionRejected,
);

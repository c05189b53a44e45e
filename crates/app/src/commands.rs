//! Commands: requests to perform one use case each.
//!
//! A command is handled by exactly one handler, which turns it into a single
//! domain event. Identifiers are not checked here: a nil id is a valid
//! value and simply matches no aggregate downstream.

use safelink_domain::area::Area;
use safelink_domain::emergency::{EmergencyAttachments, EmergencyType, Severity};
use safelink_domain::id::{EmergencyId, UserId};
use safelink_domain::location::Location;
use safelink_domain::user::UserStatus;

/// Declare a new emergency.
#[derive(Debug, Clone)]
pub struct StartEmergency {
    pub initiator_user_id: UserId,
    pub emergency_type: Option<EmergencyType>,
    pub location: Location,
    /// Empty means "derive one area from the location and type".
    pub affected_areas: Vec<Area>,
    pub severity: Severity,
    pub description: String,
    pub attachments: Option<EmergencyAttachments>,
}

impl StartEmergency {
    /// A medium-severity emergency at `location` with no explicit areas.
    #[must_use]
    pub fn new(initiator_user_id: UserId, location: Location) -> Self {
        Self {
            initiator_user_id,
            emergency_type: None,
            location,
            affected_areas: Vec::new(),
            severity: Severity::default(),
            description: String::new(),
            attachments: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, emergency_type: EmergencyType) -> Self {
        self.emergency_type = Some(emergency_type);
        self
    }
}

/// Declare an emergency over.
#[derive(Debug, Clone)]
pub struct EndEmergency {
    pub emergency_id: EmergencyId,
    pub resolution_note: Option<String>,
}

/// Report a user's status for an emergency.
#[derive(Debug, Clone)]
pub struct MarkUserStatus {
    pub user_id: UserId,
    pub emergency_id: EmergencyId,
    pub status: UserStatus,
    pub message: String,
}

/// Ask to follow another user.
#[derive(Debug, Clone, Copy)]
pub struct RequestSubscription {
    pub subscriber_id: UserId,
    pub subscribed_to_id: UserId,
}

/// Accept a pending follow request.
#[derive(Debug, Clone, Copy)]
pub struct ApproveSubscription {
    pub subscriber_id: UserId,
    pub subscribed_to_id: UserId,
}

/// Decline a pending follow request.
#[derive(Debug, Clone, Copy)]
pub struct RejectSubscription {
    pub subscriber_id: UserId,
    pub subscribed_to_id: UserId,
}

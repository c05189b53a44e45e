//! Emergency response: one check-in from a user.

use serde::{Deserialize, Serialize};

use crate::id::UserId;
use crate::time::{Timestamp, now};

/// A user's answer to an emergency: safe or not, with an optional message.
///
/// Equality covers every field including `responded_at`, so two responses
/// captured at different instants are never equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyResponse {
    pub user_id: UserId,
    pub is_safe: bool,
    pub message: String,
    pub responded_at: Timestamp,
}

impl EmergencyResponse {
    /// Record a response stamped with the current time.
    #[must_use]
    pub fn new(user_id: UserId, is_safe: bool, message: impl Into<String>) -> Self {
        Self::at(user_id, is_safe, message, now())
    }

    /// Rebuild a response captured at a known instant.
    #[must_use]
    pub fn at(
        user_id: UserId,
        is_safe: bool,
        message: impl Into<String>,
        responded_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            is_safe,
            message: message.into(),
            responded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_not_be_equal_when_timestamps_differ() {
        let user = UserId::new();
        let ts = now();
        let a = EmergencyResponse::at(user, true, "ok", ts);
        let b = EmergencyResponse::at(user, true, "ok", ts + chrono::Duration::milliseconds(1));
        assert_ne!(a, b);
    }

    #[test]
    fn should_be_equal_when_captured_at_same_instant() {
        let user = UserId::new();
        let ts = now();
        assert_eq!(
            EmergencyResponse::at(user, false, "help", ts),
            EmergencyResponse::at(user, false, "help", ts)
        );
    }
}

//! Subscription: one user following another user's status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{SubscriptionId, UserId};
use crate::time::{Timestamp, now};

use super::UserStatus;

/// Approval state of a [`Subscription`].
///
/// `Pending` moves to `Approved` or `Rejected`; both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SubscriptionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ValidationError::UnknownValue(format!(
                "subscription status {other}"
            ))),
        }
    }
}

/// The relationship "`subscriber_id` follows `subscribed_to_id`".
///
/// Owned by the subscribed-to [`User`](super::User). `approved_at` is set
/// only on the transition into [`SubscriptionStatus::Approved`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    id: SubscriptionId,
    subscriber_id: UserId,
    subscribed_to_id: UserId,
    status: SubscriptionStatus,
    created_at: Timestamp,
    approved_at: Option<Timestamp>,
    last_known_status: Option<UserStatus>,
}

impl Subscription {
    /// Create a subscription. Without an approval gate it starts approved,
    /// with no `approved_at` since no approval took place.
    #[must_use]
    pub fn new(subscriber_id: UserId, subscribed_to_id: UserId, requires_approval: bool) -> Self {
        let status = if requires_approval {
            SubscriptionStatus::Pending
        } else {
            SubscriptionStatus::Approved
        };
        Self {
            id: SubscriptionId::new(),
            subscriber_id,
            subscribed_to_id,
            status,
            created_at: now(),
            approved_at: None,
            last_known_status: None,
        }
    }

    /// Rehydrate a persisted subscription.
    #[must_use]
    pub fn restore(subscriber_id: UserId, subscribed_to_id: UserId) -> SubscriptionRestore {
        SubscriptionRestore {
            inner: Self {
                id: SubscriptionId::new(),
                subscriber_id,
                subscribed_to_id,
                status: SubscriptionStatus::Pending,
                created_at: now(),
                approved_at: None,
                last_known_status: None,
            },
        }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[must_use]
    pub fn subscriber_id(&self) -> UserId {
        self.subscriber_id
    }

    #[must_use]
    pub fn subscribed_to_id(&self) -> UserId {
        self.subscribed_to_id
    }

    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[must_use]
    pub fn approved_at(&self) -> Option<Timestamp> {
        self.approved_at
    }

    #[must_use]
    pub fn last_known_status(&self) -> Option<UserStatus> {
        self.last_known_status
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == SubscriptionStatus::Pending
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == SubscriptionStatus::Approved
    }

    /// Whether this subscription links `subscriber_id` to `subscribed_to_id`.
    #[must_use]
    pub fn links(&self, subscriber_id: UserId, subscribed_to_id: UserId) -> bool {
        self.subscriber_id == subscriber_id && self.subscribed_to_id == subscribed_to_id
    }

    /// Pending → Approved. Returns `false` and changes nothing otherwise.
    pub fn approve(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = SubscriptionStatus::Approved;
        self.approved_at = Some(now());
        true
    }

    /// Pending → Rejected. Returns `false` and changes nothing otherwise.
    pub fn reject(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = SubscriptionStatus::Rejected;
        true
    }

    pub fn update_last_known_status(&mut self, status: UserStatus) {
        self.last_known_status = Some(status);
    }
}

/// Setters used by stores to rebuild a [`Subscription`] from persisted columns.
#[derive(Debug)]
pub struct SubscriptionRestore {
    inner: Subscription,
}

impl SubscriptionRestore {
    #[must_use]
    pub fn id(mut self, id: SubscriptionId) -> Self {
        self.inner.id = id;
        self
    }

    #[must_use]
    pub fn status(mut self, status: SubscriptionStatus) -> Self {
        self.inner.status = status;
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.inner.created_at = created_at;
        self
    }

    #[must_use]
    pub fn approved_at(mut self, approved_at: Option<Timestamp>) -> Self {
        self.inner.approved_at = approved_at;
        self
    }

    #[must_use]
    pub fn last_known_status(mut self, status: Option<UserStatus>) -> Self {
        self.inner.last_known_status = status;
        self
    }

    /// Finish the rebuild. A stray `approved_at` on a non-approved row is dropped.
    #[must_use]
    pub fn finish(mut self) -> Subscription {
        if self.inner.status != SubscriptionStatus::Approved {
            self.inner.approved_at = None;
        }
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Subscription {
        Subscription::new(UserId::new(), UserId::new(), true)
    }

    #[test]
    fn should_start_pending_when_approval_required() {
        let sub = pending();
        assert_eq!(sub.status(), SubscriptionStatus::Pending);
        assert!(sub.approved_at().is_none());
    }

    #[test]
    fn should_start_approved_when_no_approval_required() {
        let sub = Subscription::new(UserId::new(), UserId::new(), false);
        assert_eq!(sub.status(), SubscriptionStatus::Approved);
        assert!(sub.approved_at().is_none());
    }

    #[test]
    fn should_set_approved_at_when_approved() {
        let mut sub = pending();
        assert!(sub.approve());
        assert_eq!(sub.status(), SubscriptionStatus::Approved);
        assert!(sub.approved_at().is_some());
    }

    #[test]
    fn should_leave_approved_at_empty_when_rejected() {
        let mut sub = pending();
        assert!(sub.reject());
        assert_eq!(sub.status(), SubscriptionStatus::Rejected);
        assert!(sub.approved_at().is_none());
    }

    #[test]
    fn should_stay_rejected_when_approved_after_rejection() {
        let mut sub = pending();
        sub.reject();
        assert!(!sub.approve());
        assert_eq!(sub.status(), SubscriptionStatus::Rejected);
        assert!(sub.approved_at().is_none());
    }

    #[test]
    fn should_stay_approved_when_rejected_after_approval() {
        let mut sub = pending();
        sub.approve();
        let approved_at = sub.approved_at();
        assert!(!sub.reject());
        assert_eq!(sub.status(), SubscriptionStatus::Approved);
        assert_eq!(sub.approved_at(), approved_at);
    }

    #[test]
    fn should_drop_approved_at_when_restoring_pending_row() {
        let sub = Subscription::restore(UserId::new(), UserId::new())
            .status(SubscriptionStatus::Pending)
            .approved_at(Some(now()))
            .finish();
        assert!(sub.approved_at().is_none());
    }

    #[test]
    fn should_parse_status_from_str() {
        assert_eq!(
            "approved".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Approved
        );
        assert!("bogus".parse::<SubscriptionStatus>().is_err());
    }
}

//! User: the aggregate owning incoming subscriptions.
//!
//! A user owns every [`Subscription`] in which it is the *subscribed-to*
//! side. The subscriber side is a derived read-only view assembled by stores.

mod subscription;

pub use subscription::{Subscription, SubscriptionRestore, SubscriptionStatus};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::event::{SubscriptionApproved, SubscriptionRejected, SubscriptionRequested};
use crate::id::UserId;

/// Self-reported safety status during an emergency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Safe,
    Unsafe,
    HelpNeeded,
}

impl UserStatus {
    #[must_use]
    pub fn is_safe(self) -> bool {
        self == Self::Safe
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Unsafe => "unsafe",
            Self::HelpNeeded => "help_needed",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(Self::Safe),
            "unsafe" => Ok(Self::Unsafe),
            "help_needed" => Ok(Self::HelpNeeded),
            other => Err(ValidationError::UnknownValue(format!("user status {other}"))),
        }
    }
}

/// Where a user wants to be notified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum NotificationChannel {
    Sms { phone_number: String },
    Email { address: String },
    Push { device_token: String },
}

/// A registered person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    phone_number: String,
    is_active: bool,
    requires_approval: bool,
    notification_channels: Vec<NotificationChannel>,
    subscriptions: Vec<Subscription>,
    version: u64,
}

impl User {
    /// Create a builder for constructing a [`User`].
    #[must_use]
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    /// Sentinel returned by lookups that found nothing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            id: UserId::nil(),
            name: String::new(),
            email: String::new(),
            phone_number: String::new(),
            is_active: false,
            requires_approval: true,
            notification_channels: Vec::new(),
            subscriptions: Vec::new(),
            version: 0,
        }
    }

    /// Whether this is the [`User::none`] sentinel.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.id.is_nil()
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn notification_channels(&self) -> &[NotificationChannel] {
        &self.notification_channels
    }

    #[must_use]
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    #[must_use]
    pub fn requires_subscription_approval(&self) -> bool {
        self.requires_approval
    }

    pub fn set_requires_approval(&mut self, requires_approval: bool) {
        self.requires_approval = requires_approval;
    }

    pub fn toggle_approval(&mut self) {
        self.requires_approval = !self.requires_approval;
    }

    /// Add a channel unless an identical one is already registered.
    pub fn add_notification_channel(&mut self, channel: NotificationChannel) {
        if !self.notification_channels.contains(&channel) {
            self.notification_channels.push(channel);
        }
    }

    pub fn remove_notification_channel(&mut self, channel: &NotificationChannel) {
        self.notification_channels.retain(|c| c != channel);
    }

    /// The subscription from `subscriber_id` to this user, if any.
    #[must_use]
    pub fn subscription_from(&self, subscriber_id: UserId) -> Option<&Subscription> {
        self.subscriptions
            .iter()
            .find(|s| s.links(subscriber_id, self.id))
    }

    /// Ids of users with an approved subscription to this user.
    #[must_use]
    pub fn subscribers(&self) -> Vec<UserId> {
        self.subscriptions
            .iter()
            .filter(|s| s.is_approved())
            .map(Subscription::subscriber_id)
            .collect()
    }

    /// Subscriptions still waiting for this user's decision.
    pub fn pending_requests(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.iter().filter(|s| s.is_pending())
    }

    /// Create the subscription requested by `event`.
    ///
    /// The initial status follows this user's approval setting *now*, not at
    /// the time the request was made. Returns `false` when a subscription for
    /// the same pair already exists.
    pub fn on_subscription_requested(&mut self, event: &SubscriptionRequested) -> bool {
        if self.find_mut(event.subscriber_id, event.subscribed_to_id).is_some() {
            return false;
        }
        self.subscriptions.push(Subscription::new(
            event.subscriber_id,
            event.subscribed_to_id,
            self.requires_approval,
        ));
        true
    }

    /// Approve the matching subscription. Returns `false` when none is pending.
    pub fn on_subscription_approved(&mut self, event: &SubscriptionApproved) -> bool {
        self.find_mut(event.subscriber_id, event.subscribed_to_id)
            .is_some_and(Subscription::approve)
    }

    /// Reject the matching subscription. Returns `false` when none is pending.
    pub fn on_subscription_rejected(&mut self, event: &SubscriptionRejected) -> bool {
        self.find_mut(event.subscriber_id, event.subscribed_to_id)
            .is_some_and(Subscription::reject)
    }

    /// Cache `status` on every subscription this user owns.
    ///
    /// Returns how many subscriptions were updated.
    pub fn record_status(&mut self, status: UserStatus) -> usize {
        for subscription in &mut self.subscriptions {
            subscription.update_last_known_status(status);
        }
        self.subscriptions.len()
    }

    fn find_mut(
        &mut self,
        subscriber_id: UserId,
        subscribed_to_id: UserId,
    ) -> Option<&mut Subscription> {
        self.subscriptions
            .iter_mut()
            .find(|s| s.links(subscriber_id, subscribed_to_id))
    }
}

/// Step-by-step builder for [`User`].
#[derive(Debug)]
pub struct UserBuilder {
    id: Option<UserId>,
    name: String,
    email: String,
    phone_number: String,
    is_active: bool,
    requires_approval: bool,
    notification_channels: Vec<NotificationChannel>,
    subscriptions: Vec<Subscription>,
    version: u64,
}

impl Default for UserBuilder {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            email: String::new(),
            phone_number: String::new(),
            is_active: true,
            requires_approval: true,
            notification_channels: Vec::new(),
            subscriptions: Vec::new(),
            version: 0,
        }
    }
}

impl UserBuilder {
    #[must_use]
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    #[must_use]
    pub fn phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = phone_number.into();
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    #[must_use]
    pub fn requires_approval(mut self, requires_approval: bool) -> Self {
        self.requires_approval = requires_approval;
        self
    }

    #[must_use]
    pub fn notification_channels(
        mut self,
        channels: impl IntoIterator<Item = NotificationChannel>,
    ) -> Self {
        self.notification_channels.extend(channels);
        self
    }

    #[must_use]
    pub fn subscriptions(mut self, subscriptions: impl IntoIterator<Item = Subscription>) -> Self {
        self.subscriptions.extend(subscriptions);
        self
    }

    #[must_use]
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Consume the builder, validate, and return a [`User`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when name, email or phone number is blank.
    pub fn build(self) -> Result<User, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        if self.phone_number.trim().is_empty() {
            return Err(ValidationError::EmptyPhoneNumber);
        }

        Ok(User {
            id: self.id.unwrap_or_default(),
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            is_active: self.is_active,
            requires_approval: self.requires_approval,
            notification_channels: self.notification_channels,
            subscriptions: self.subscriptions,
            version: self.version,
        })
    }
}

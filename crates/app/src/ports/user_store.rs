//! User store port: persistence for the [`User`] aggregate and its
//! subscriptions.

use std::future::Future;

use safelink_domain::error::SafelinkError;
use safelink_domain::id::UserId;
use safelink_domain::user::{Subscription, User};

/// Load and persist [`User`] aggregates.
///
/// A user is stored together with the subscriptions it owns (those where it
/// is the subscribed-to side). Versioning follows the same rules as
/// [`EmergencyStore`](super::EmergencyStore).
pub trait UserStore {
    /// Look up a user, returning [`User::none`] when absent.
    fn get_by_id(&self, id: UserId) -> impl Future<Output = Result<User, SafelinkError>> + Send;

    fn add(&self, user: User) -> impl Future<Output = Result<User, SafelinkError>> + Send;

    /// Write the full aggregate state, inserting it when absent.
    fn save(&self, user: User) -> impl Future<Output = Result<User, SafelinkError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<User>, SafelinkError>> + Send;

    fn get_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, SafelinkError>> + Send;

    /// Remove a user and its subscriptions. Returns whether anything was deleted.
    fn delete(&self, id: UserId) -> impl Future<Output = Result<bool, SafelinkError>> + Send;

    /// Whether requests to follow `id` start pending. Unknown users require approval.
    fn requires_subscription_approval(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<bool, SafelinkError>> + Send;

    /// Subscriber-side view: every subscription `subscriber_id` has made.
    fn subscriptions_of(
        &self,
        subscriber_id: UserId,
    ) -> impl Future<Output = Result<Vec<Subscription>, SafelinkError>> + Send;
}

impl<T: UserStore + Send + Sync> UserStore for std::sync::Arc<T> {
    fn get_by_id(&self, id: UserId) -> impl Future<Output = Result<User, SafelinkError>> + Send {
        (**self).get_by_id(id)
    }

    fn add(&self, user: User) -> impl Future<Output = Result<User, SafelinkError>> + Send {
        (**self).add(user)
    }

    fn save(&self, user: User) -> impl Future<Output = Result<User, SafelinkError>> + Send {
        (**self).save(user)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<User>, SafelinkError>> + Send {
        (**self).get_all()
    }

    fn get_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, SafelinkError>> + Send {
        (**self).get_by_email(email)
    }

    fn delete(&self, id: UserId) -> impl Future<Output = Result<bool, SafelinkError>> + Send {
        (**self).delete(id)
    }

    fn requires_subscription_approval(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<bool, SafelinkError>> + Send {
        (**self).requires_subscription_approval(id)
    }

    fn subscriptions_of(
        &self,
        subscriber_id: UserId,
    ) -> impl Future<Output = Result<Vec<Subscription>, SafelinkError>> + Send {
        (**self).subscriptions_of(subscriber_id)
    }
}

//! In-memory ports for unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use safelink_domain::emergency::{Emergency, EmergencyStatus};
use safelink_domain::error::{ConflictError, SafelinkError};
use safelink_domain::event::DomainEvent;
use safelink_domain::id::{EmergencyId, UserId};
use safelink_domain::user::{Subscription, User};

use crate::ports::{EmergencyStore, EventPublisher, UserStore};

#[derive(Default)]
pub struct InMemoryEmergencyStore {
    store: Mutex<HashMap<EmergencyId, Emergency>>,
}

impl InMemoryEmergencyStore {
    pub fn count(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn get(&self, id: EmergencyId) -> Option<Emergency> {
        self.store.lock().unwrap().get(&id).cloned()
    }
}

fn conflict(entity: &'static str, id: impl ToString, expected_version: u64) -> SafelinkError {
    ConflictError {
        entity,
        id: id.to_string(),
        expected_version,
    }
    .into()
}

impl EmergencyStore for InMemoryEmergencyStore {
    fn get_by_id(
        &self,
        id: EmergencyId,
    ) -> impl Future<Output = Result<Option<Emergency>, SafelinkError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn add(
        &self,
        mut emergency: Emergency,
    ) -> impl Future<Output = Result<Emergency, SafelinkError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(&emergency.id()) {
            Err(conflict("Emergency", emergency.id(), 0))
        } else {
            emergency.set_version(1);
            store.insert(emergency.id(), emergency.clone());
            Ok(emergency)
        };
        async { result }
    }

    fn save(
        &self,
        mut emergency: Emergency,
    ) -> impl Future<Output = Result<Emergency, SafelinkError>> + Send {
        let mut store = self.store.lock().unwrap();
        let stored_version = store.get(&emergency.id()).map(Emergency::version);
        let result = match stored_version {
            Some(v) if v != emergency.version() => {
                Err(conflict("Emergency", emergency.id(), emergency.version()))
            }
            _ => {
                emergency.set_version(stored_version.unwrap_or(0) + 1);
                store.insert(emergency.id(), emergency.clone());
                Ok(emergency)
            }
        };
        async { result }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send {
        let result: Vec<Emergency> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn get_by_status(
        &self,
        status: EmergencyStatus,
    ) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send {
        let result: Vec<Emergency> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.status() == status)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn get_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send {
        let result: Vec<Emergency> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.initiator_id() == user_id || e.has_response_from(user_id))
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    store: Mutex<HashMap<UserId, User>>,
    fail_saves: AtomicBool,
}

impl InMemoryUserStore {
    /// Make every later `save` fail with a storage error.
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, id: UserId) -> Option<User> {
        self.store.lock().unwrap().get(&id).cloned()
    }

    /// Insert directly, bypassing versioning.
    pub fn seed(&self, mut user: User) -> User {
        user.set_version(1);
        self.store.lock().unwrap().insert(user.id(), user.clone());
        user
    }
}

impl UserStore for InMemoryUserStore {
    fn get_by_id(&self, id: UserId) -> impl Future<Output = Result<User, SafelinkError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_else(User::none);
        async { Ok(result) }
    }

    fn add(&self, mut user: User) -> impl Future<Output = Result<User, SafelinkError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(&user.id()) {
            Err(conflict("User", user.id(), 0))
        } else {
            user.set_version(1);
            store.insert(user.id(), user.clone());
            Ok(user)
        };
        async { result }
    }

    fn save(&self, mut user: User) -> impl Future<Output = Result<User, SafelinkError>> + Send {
        let mut store = self.store.lock().unwrap();
        let stored_version = store.get(&user.id()).map(User::version);
        let result = match stored_version {
            _ if self.fail_saves.load(Ordering::SeqCst) => {
                Err(SafelinkError::Storage("disk full".into()))
            }
            Some(v) if v != user.version() => Err(conflict("User", user.id(), user.version())),
            _ => {
                user.set_version(stored_version.unwrap_or(0) + 1);
                store.insert(user.id(), user.clone());
                Ok(user)
            }
        };
        async { result }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<User>, SafelinkError>> + Send {
        let result: Vec<User> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn get_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, SafelinkError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email() == email)
            .cloned();
        async { Ok(result) }
    }

    fn delete(&self, id: UserId) -> impl Future<Output = Result<bool, SafelinkError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id).is_some();
        async move { Ok(removed) }
    }

    fn requires_subscription_approval(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<bool, SafelinkError>> + Send {
        let result = self
            .store
            .lock()
            .unwrap()
            .get(&id)
            .is_none_or(User::requires_subscription_approval);
        async move { Ok(result) }
    }

    fn subscriptions_of(
        &self,
        subscriber_id: UserId,
    ) -> impl Future<Output = Result<Vec<Subscription>, SafelinkError>> + Send {
        let result: Vec<Subscription> = self
            .store
            .lock()
            .unwrap()
            .values()
            .flat_map(User::subscriptions)
            .filter(|s| s.subscriber_id() == subscriber_id)
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

/// Publisher that only records what it was given.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<DomainEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.published.lock().unwrap().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(
        &self,
        event: DomainEvent,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), SafelinkError>> + Send {
        let result = if cancel.is_cancelled() {
            Err(SafelinkError::Cancelled)
        } else {
            self.published.lock().unwrap().push(event);
            Ok(())
        };
        async { result }
    }
}

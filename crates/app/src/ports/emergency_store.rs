//! Emergency store port: persistence for the [`Emergency`] aggregate.

use std::future::Future;

use safelink_domain::emergency::{Emergency, EmergencyStatus};
use safelink_domain::error::SafelinkError;
use safelink_domain::id::{EmergencyId, UserId};

/// Load and persist [`Emergency`] aggregates.
///
/// Writes are guarded by the aggregate's `version`: `save` fails with
/// [`SafelinkError::Conflict`] when the stored version is not the one the
/// caller loaded, so two concurrent load-mutate-save cycles can never
/// silently overwrite each other.
pub trait EmergencyStore {
    /// Look up an emergency by id.
    fn get_by_id(
        &self,
        id: EmergencyId,
    ) -> impl Future<Output = Result<Option<Emergency>, SafelinkError>> + Send;

    /// Insert a new emergency. Returns it with its first version.
    fn add(
        &self,
        emergency: Emergency,
    ) -> impl Future<Output = Result<Emergency, SafelinkError>> + Send;

    /// Write the full aggregate state, inserting it when absent.
    ///
    /// Returns the aggregate carrying its new version.
    fn save(
        &self,
        emergency: Emergency,
    ) -> impl Future<Output = Result<Emergency, SafelinkError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send;

    fn get_by_status(
        &self,
        status: EmergencyStatus,
    ) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send;

    /// Shorthand for `get_by_status(Active)`.
    fn get_active(&self) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send {
        self.get_by_status(EmergencyStatus::Active)
    }

    /// Emergencies the user initiated or responded to.
    fn get_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send;
}

impl<T: EmergencyStore + Send + Sync> EmergencyStore for std::sync::Arc<T> {
    fn get_by_id(
        &self,
        id: EmergencyId,
    ) -> impl Future<Output = Result<Option<Emergency>, SafelinkError>> + Send {
        (**self).get_by_id(id)
    }

    fn add(
        &self,
        emergency: Emergency,
    ) -> impl Future<Output = Result<Emergency, SafelinkError>> + Send {
        (**self).add(emergency)
    }

    fn save(
        &self,
        emergency: Emergency,
    ) -> impl Future<Output = Result<Emergency, SafelinkError>> + Send {
        (**self).save(emergency)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send {
        (**self).get_all()
    }

    fn get_by_status(
        &self,
        status: EmergencyStatus,
    ) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send {
        (**self).get_by_status(status)
    }

    fn get_active(&self) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send {
        (**self).get_active()
    }

    fn get_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Emergency>, SafelinkError>> + Send {
        (**self).get_by_user(user_id)
    }
}

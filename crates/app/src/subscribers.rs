//! Event subscribers: apply published events to aggregates.
//!
//! Every subscriber follows the same cycle: load the aggregate, mutate it,
//! save it. A missing aggregate is a silent no-op (logged at `debug`);
//! store failures and version conflicts propagate to the publisher.

mod emergency;
mod status_broadcast;
mod subscription;

pub use emergency::EmergencyEventSubscriber;
pub use status_broadcast::StatusBroadcastSubscriber;
pub use subscription::SubscriptionEventSubscriber;

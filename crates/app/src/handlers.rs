//! Command handlers: one per use case.
//!
//! Each handler turns its command into exactly one domain event and
//! publishes it. Handlers never persist aggregates; subscribers do.

mod emergency;
mod subscription;

pub use emergency::{EndEmergencyHandler, MarkUserStatusHandler, StartEmergencyHandler};
pub use subscription::{
    ApproveSubscriptionHandler, RejectSubscriptionHandler, RequestSubscriptionHandler,
};

use std::future::Future;

use tokio_util::sync::CancellationToken;

use safelink_domain::error::SafelinkError;

/// Handles one command type.
pub trait CommandHandler<C> {
    type Output;

    fn handle(
        &self,
        command: C,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Self::Output, SafelinkError>> + Send;
}

/// Every handler, sharing one publisher and one user store.
pub struct Handlers<P, U> {
    pub start_emergency: StartEmergencyHandler<P>,
    pub end_emergency: EndEmergencyHandler<P>,
    pub mark_user_status: MarkUserStatusHandler<P>,
    pub request_subscription: RequestSubscriptionHandler<P>,
    pub approve_subscription: ApproveSubscriptionHandler<P, U>,
    pub reject_subscription: RejectSubscriptionHandler<P, U>,
}

impl<P: Clone, U: Clone> Handlers<P, U> {
    #[must_use]
    pub fn new(publisher: P, users: U) -> Self {
        Self {
            start_emergency: StartEmergencyHandler::new(publisher.clone()),
            end_emergency: EndEmergencyHandler::new(publisher.clone()),
            mark_user_status: MarkUserStatusHandler::new(publisher.clone()),
            request_subscription: RequestSubscriptionHandler::new(publisher.clone()),
            approve_subscription: ApproveSubscriptionHandler::new(publisher.clone(), users.clone()),
            reject_subscription: RejectSubscriptionHandler::new(publisher, users),
        }
    }
}

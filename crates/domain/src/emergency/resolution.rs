//! Auto-resolution policies.
//!
//! The system has no built-in notion of who is expected to respond to an
//! emergency, so resolution-on-check-in is a pluggable predicate. The
//! default never resolves.

use std::collections::HashSet;

use crate::id::UserId;

use super::Emergency;

/// Decides whether an emergency can be resolved after a new response.
pub trait ResolutionPolicy: Send + Sync {
    fn should_resolve(&self, emergency: &Emergency) -> bool;
}

/// Never resolves automatically; emergencies end only through an explicit end.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAutoResolve;

impl ResolutionPolicy for NeverAutoResolve {
    fn should_resolve(&self, _emergency: &Emergency) -> bool {
        false
    }
}

/// Resolves once every user in a caller-supplied roster has responded.
///
/// An empty roster never resolves.
#[derive(Debug, Clone, Default)]
pub struct ExpectedResponders {
    expected: HashSet<UserId>,
}

impl ExpectedResponders {
    #[must_use]
    pub fn new(expected: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            expected: expected.into_iter().collect(),
        }
    }
}

impl ResolutionPolicy for ExpectedResponders {
    fn should_resolve(&self, emergency: &Emergency) -> bool {
        !self.expected.is_empty()
            && self
                .expected
                .iter()
                .all(|user| emergency.has_response_from(*user))
    }
}

impl<F> ResolutionPolicy for F
where
    F: Fn(&Emergency) -> bool + Send + Sync,
{
    fn should_resolve(&self, emergency: &Emergency) -> bool {
        self(emergency)
    }
}

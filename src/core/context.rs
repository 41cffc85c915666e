//! Per-activation view handed to state hooks and guards.

use super::signal::CompletionSignal;
use chrono::{DateTime, Utc};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// What a state can see about itself while a hook runs.
///
/// The context borrows machine-owned slot data; it never borrows the machine
/// itself, so hooks cannot re-enter it. Use [`complete`](Self::complete) or
/// [`request_state`](Self::request_state) to ask for a transition.
pub struct StateContext<'a, E> {
    pub(crate) id: &'a str,
    pub(crate) tag: &'a str,
    pub(crate) entity: &'a Weak<E>,
    pub(crate) signal: &'a CompletionSignal,
    pub(crate) entered_at: Option<DateTime<Utc>>,
}

impl<'a, E> StateContext<'a, E> {
    /// Id the state is registered under.
    pub fn id(&self) -> &str {
        self.id
    }

    /// Tag of the state.
    pub fn tag(&self) -> &str {
        self.tag
    }

    /// The bound entity, if the machine has one and it is still alive.
    pub fn entity(&self) -> Option<Rc<E>> {
        self.entity.upgrade()
    }

    /// Clone of the completion signal for this activation.
    ///
    /// Hand it to long-running work that finishes later; signals from a
    /// finished activation are ignored by the machine.
    pub fn completion(&self) -> CompletionSignal {
        self.signal.clone()
    }

    /// Report that this state finished its work.
    pub fn complete(&self) {
        self.signal.complete();
    }

    /// Ask the machine to jump to the state with `id`, bypassing guards.
    pub fn request_state(&self, id: impl Into<String>) {
        self.signal.request_state(id);
    }

    /// When the state was entered; `None` for a state that is not active.
    pub fn entered_at(&self) -> Option<DateTime<Utc>> {
        self.entered_at
    }

    /// Time spent in the state so far.
    pub fn state_time(&self) -> Duration {
        self.entered_at.map(elapsed_since).unwrap_or(Duration::ZERO)
    }
}

/// Elapsed wall time since `start`, clamped at zero.
pub(crate) fn elapsed_since(start: DateTime<Utc>) -> Duration {
    Utc::now()
        .signed_duration_since(start)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

//! Builder API for ergonomic machine construction.
//!
//! This module provides fluent builders and the [`state_kind!`](crate::state_kind)
//! macro for declaring machines with minimal boilerplate.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use transition::TransitionBuilder;

use crate::core::Condition;
use crate::machine::{Origin, StateRef, TransitionSpec};

/// Create a transition taken when `from` completes.
///
/// # Example
///
/// ```
/// use tickstate::builder::completion_transition;
/// use tickstate::Origin;
///
/// let spec = completion_transition(Origin::Any, "Idle");
/// assert_eq!(spec.probability, 1.0);
/// ```
pub fn completion_transition(
    from: impl Into<Origin>,
    to: impl Into<StateRef>,
) -> TransitionSpec {
    TransitionSpec::new(from, to)
}

/// Create a transition polled every tick.
///
/// # Example
///
/// ```
/// use tickstate::builder::conditional_transition;
///
/// let spec = conditional_transition("Idle", "Alarm", || false);
/// assert!(spec.condition.is_some());
/// ```
pub fn conditional_transition<F>(
    from: impl Into<Origin>,
    to: impl Into<StateRef>,
    condition: F,
) -> TransitionSpec
where
    F: Fn() -> bool + 'static,
{
    TransitionSpec {
        condition: Some(Condition::new(condition)),
        ..TransitionSpec::new(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_transition_has_no_condition() {
        let spec = completion_transition("Idle", "Wander");

        assert_eq!(spec.from, Origin::State(StateRef::Id("Idle".to_string())));
        assert!(spec.condition.is_none());
    }

    #[test]
    fn conditional_transition_carries_condition() {
        let spec = conditional_transition("Idle", "Wander", || true);
        assert!(spec.condition.as_ref().is_some_and(Condition::check));
    }
}

//! Runtime transition types and state references.

use crate::core::Condition;

/// Handle to a state owned by a [`Machine`](crate::Machine).
///
/// Keys are only meaningful for the machine that returned them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(pub(crate) usize);

impl StateKey {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A state named either by id or by key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateRef {
    Id(String),
    Key(StateKey),
}

impl From<&str> for StateRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for StateRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<&String> for StateRef {
    fn from(id: &String) -> Self {
        Self::Id(id.clone())
    }
}

impl From<StateKey> for StateRef {
    fn from(key: StateKey) -> Self {
        Self::Key(key)
    }
}

/// Where a transition may be taken from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Every state (wildcard edge).
    Any,
    /// One specific state.
    State(StateRef),
}

impl From<StateRef> for Origin {
    fn from(state: StateRef) -> Self {
        Self::State(state)
    }
}

impl From<&str> for Origin {
    fn from(id: &str) -> Self {
        Self::State(id.into())
    }
}

impl From<String> for Origin {
    fn from(id: String) -> Self {
        Self::State(id.into())
    }
}

impl From<&String> for Origin {
    fn from(id: &String) -> Self {
        Self::State(id.into())
    }
}

impl From<StateKey> for Origin {
    fn from(key: StateKey) -> Self {
        Self::State(key.into())
    }
}

/// Fully described transition, ready to be added to a machine.
///
/// Usually produced by [`TransitionBuilder`](crate::builder::TransitionBuilder).
#[derive(Debug)]
pub struct TransitionSpec {
    pub from: Origin,
    pub to: StateRef,
    pub condition: Option<Condition>,
    pub probability: f32,
}

impl TransitionSpec {
    /// Completion-driven transition with probability 1.
    pub fn new(from: impl Into<Origin>, to: impl Into<StateRef>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: None,
            probability: 1.0,
        }
    }
}

/// Edge stored in the compiled graph.
#[derive(Debug)]
pub(crate) struct Transition {
    pub(crate) to: StateKey,
    pub(crate) condition: Option<Condition>,
    pub(crate) probability: f32,
}

impl Transition {
    pub(crate) fn new(to: StateKey, condition: Option<Condition>, probability: f32) -> Self {
        Self {
            to,
            condition,
            probability: clamp_probability(probability),
        }
    }

    /// True when the edge has a condition and it currently holds.
    pub(crate) fn poll(&self) -> bool {
        self.condition.as_ref().is_some_and(Condition::check)
    }

    /// True when the edge has no condition or its condition holds.
    pub(crate) fn condition_allows(&self) -> bool {
        self.condition.as_ref().map_or(true, Condition::check)
    }
}

/// Clamp to `[0, 1]`; NaN counts as never.
pub(crate) fn clamp_probability(probability: f32) -> f32 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_requires_a_condition() {
        let completion_only = Transition::new(StateKey(1), None, 1.0);
        assert!(!completion_only.poll());
        assert!(completion_only.condition_allows());

        let conditional = Transition::new(StateKey(1), Some(Condition::new(|| true)), 1.0);
        assert!(conditional.poll());
        assert!(conditional.condition_allows());

        let blocked = Transition::new(StateKey(1), Some(Condition::new(|| false)), 1.0);
        assert!(!blocked.poll());
        assert!(!blocked.condition_allows());
    }

    #[test]
    fn probability_is_clamped() {
        assert_eq!(Transition::new(StateKey(0), None, 1.7).probability, 1.0);
        assert_eq!(Transition::new(StateKey(0), None, -0.2).probability, 0.0);
        assert_eq!(Transition::new(StateKey(0), None, f32::NAN).probability, 0.0);
        assert_eq!(Transition::new(StateKey(0), None, 0.25).probability, 0.25);
    }

    #[test]
    fn references_convert_from_ids_and_keys() {
        assert_eq!(StateRef::from("Idle"), StateRef::Id("Idle".to_string()));
        assert_eq!(StateRef::from(StateKey(3)), StateRef::Key(StateKey(3)));
        assert_eq!(
            Origin::from("Idle"),
            Origin::State(StateRef::Id("Idle".to_string()))
        );
        assert_eq!(
            TransitionSpec::new(Origin::Any, StateKey(0)).from,
            Origin::Any
        );
    }
}

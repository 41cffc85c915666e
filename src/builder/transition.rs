//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::core::Condition;
use crate::machine::{Origin, StateRef, TransitionSpec};

/// Builder for constructing transitions with a fluent API.
///
/// A transition without [`when`](Self::when) is taken on completion; one with
/// a condition is polled every tick.
#[derive(Debug)]
pub struct TransitionBuilder {
    from: Option<Origin>,
    to: Option<StateRef>,
    condition: Option<Condition>,
    probability: f32,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            from: None,
            to: None,
            condition: None,
            probability: 1.0,
        }
    }

    /// Set the source state (required unless `from_any`).
    pub fn from(mut self, state: impl Into<Origin>) -> Self {
        self.from = Some(state.into());
        self
    }

    /// Make the transition apply to every state.
    pub fn from_any(mut self) -> Self {
        self.from = Some(Origin::Any);
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: impl Into<StateRef>) -> Self {
        self.to = Some(state.into());
        self
    }

    /// Add a condition (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        self.condition = Some(Condition::new(predicate));
        self
    }

    /// Set the completion probability (optional, defaults to 1).
    pub fn probability(mut self, probability: f32) -> Self {
        self.probability = probability;
        self
    }

    /// Build the transition.
    pub fn build(self) -> Result<TransitionSpec, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let to = self.to.ok_or(BuildError::MissingToState)?;
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(BuildError::InvalidProbability {
                value: self.probability,
            });
        }

        Ok(TransitionSpec {
            from,
            to,
            condition: self.condition,
            probability: self.probability,
        })
    }
}

impl Default for TransitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionBuilder::new().from("Idle").build();
        assert!(matches!(result, Err(BuildError::MissingToState)));

        let result = TransitionBuilder::new().to("Idle").build();
        assert!(matches!(result, Err(BuildError::MissingFromState)));
    }

    #[test]
    fn builder_rejects_bad_probability() {
        for value in [-0.1, 1.5, f32::NAN] {
            let result = TransitionBuilder::new()
                .from("Idle")
                .to("Alarm")
                .probability(value)
                .build();
            assert!(matches!(result, Err(BuildError::InvalidProbability { .. })));
        }
    }

    #[test]
    fn fluent_api_builds_transition() {
        let spec = TransitionBuilder::new()
            .from_any()
            .to("Alarm")
            .when(|| true)
            .probability(0.5)
            .build()
            .unwrap();

        assert_eq!(spec.from, Origin::Any);
        assert_eq!(spec.to, StateRef::Id("Alarm".to_string()));
        assert!(spec.condition.as_ref().is_some_and(Condition::check));
        assert_eq!(spec.probability, 0.5);
    }
}

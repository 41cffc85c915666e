//! Validation of an authoring record against a kind registry.
//!
//! Uses Stillwater's `Validation` to accumulate every fault of a record
//! instead of stopping at the first one, so an authoring tool can report all
//! problems in a single pass.

use super::error::{AuthoringError, CompileError, Endpoint};
use super::registry::StateRegistry;
use super::AuthoringRecord;
use crate::core::State;
use std::collections::{BTreeSet, HashMap};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<AuthoringError>>;

/// A descriptor turned into a live state, not yet inserted anywhere.
pub(crate) struct ResolvedState<E: 'static> {
    pub(crate) requested_id: String,
    pub(crate) tag: Option<String>,
    pub(crate) behavior: Box<dyn State<E>>,
}

/// A transition whose endpoints are indexes into the resolved states.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ResolvedTransition {
    /// `None` for a wildcard origin
    pub(crate) from: Option<usize>,
    pub(crate) to: usize,
    pub(crate) probability: f32,
}

/// Everything the compiler needs to commit a record into a machine.
pub(crate) struct ValidatedRecord<E: 'static> {
    pub(crate) states: Vec<ResolvedState<E>>,
    pub(crate) transitions: Vec<ResolvedTransition>,
}

/// Instantiate and cross-check every part of `record`.
///
/// Transition ids resolve to the first state requesting that id; later
/// duplicates are still instantiated and renamed when inserted.
pub(crate) fn validate_record<E: 'static>(
    record: &AuthoringRecord,
    registry: &StateRegistry<E>,
) -> Result<ValidatedRecord<E>, CompileError> {
    let mut checks: Vec<Check> = Vec::new();

    let mut first_index: HashMap<&str, usize> = HashMap::new();
    for (index, descriptor) in record.states.iter().enumerate() {
        first_index.entry(descriptor.requested_id()).or_insert(index);
    }

    let mut states = Vec::with_capacity(record.states.len());
    for descriptor in &record.states {
        match registry.instantiate(&descriptor.kind, descriptor.params.as_ref()) {
            None => checks.push(Validation::fail(AuthoringError::UnknownKind {
                kind: descriptor.kind.clone(),
            })),
            Some(Err(message)) => checks.push(Validation::fail(AuthoringError::InvalidParams {
                id: descriptor.requested_id().to_string(),
                kind: descriptor.kind.clone(),
                message,
            })),
            Some(Ok(behavior)) => states.push(ResolvedState {
                requested_id: descriptor.requested_id().to_string(),
                tag: descriptor.tag.clone(),
                behavior,
            }),
        }
    }

    let present: BTreeSet<&str> = record.states.iter().map(|d| d.kind.as_str()).collect();
    for kind in &present {
        for required in registry.requirements_of(kind) {
            let check = if present.contains(required) {
                Validation::success(())
            } else {
                Validation::fail(AuthoringError::MissingRequiredKind {
                    kind: kind.to_string(),
                    required: required.to_string(),
                })
            };
            checks.push(check);
        }
    }

    let mut transitions = Vec::with_capacity(record.transitions.len());
    for (index, descriptor) in record.transitions.iter().enumerate() {
        let lookup = |id: &str, endpoint: Endpoint| {
            first_index
                .get(id)
                .copied()
                .ok_or_else(|| AuthoringError::UnknownState {
                    index,
                    endpoint,
                    id: id.to_string(),
                })
        };

        let from = if descriptor.is_wildcard() {
            Ok(None)
        } else {
            lookup(&descriptor.from, Endpoint::From).map(Some)
        };
        let to = lookup(&descriptor.to, Endpoint::To);

        if descriptor.probability.is_nan() {
            checks.push(Validation::fail(AuthoringError::InvalidProbability { index }));
        }

        match (from, to) {
            (Ok(from), Ok(to)) => transitions.push(ResolvedTransition {
                from,
                to,
                probability: descriptor.probability.clamp(0.0, 1.0),
            }),
            (from, to) => {
                if let Err(error) = from {
                    checks.push(Validation::fail(error));
                }
                if let Err(error) = to {
                    checks.push(Validation::fail(error));
                }
            }
        }
    }

    match Validation::all_vec(checks).map(|_| ()) {
        Validation::Success(_) => Ok(ValidatedRecord {
            states,
            transitions,
        }),
        Validation::Failure(errors) => Err(CompileError {
            errors: errors.iter().cloned().collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authoring::{StateDescriptor, StateKind, ANY};
    use serde::Deserialize;
    use serde_json::json;

    struct Npc;

    #[derive(Default, Deserialize)]
    struct Idle;

    impl State<Npc> for Idle {}

    impl StateKind<Npc> for Idle {
        const KIND: &'static str = "Idle";
    }

    #[derive(Default, Deserialize)]
    struct Patrol {
        #[serde(default)]
        #[allow(dead_code)]
        speed: f32,
    }

    impl State<Npc> for Patrol {}

    impl StateKind<Npc> for Patrol {
        const KIND: &'static str = "Patrol";
        const REQUIRES: &'static [&'static str] = &["Idle"];
    }

    fn registry() -> StateRegistry<Npc> {
        let mut registry = StateRegistry::new();
        registry.register::<Idle>().register::<Patrol>();
        registry
    }

    #[test]
    fn valid_record_resolves_indexes() {
        let record = AuthoringRecord::new()
            .state(StateDescriptor::new("Idle"))
            .state(StateDescriptor::new("Patrol").with_id("north"))
            .transition("Idle", "north")
            .weighted_transition(ANY, "Idle", 3.0);

        let validated = validate_record(&record, &registry()).unwrap();

        assert_eq!(validated.states.len(), 2);
        assert_eq!(validated.states[1].requested_id, "north");
        assert_eq!(
            validated.transitions,
            vec![
                ResolvedTransition {
                    from: Some(0),
                    to: 1,
                    probability: 1.0,
                },
                ResolvedTransition {
                    from: None,
                    to: 0,
                    probability: 1.0,
                },
            ]
        );
    }

    #[test]
    fn duplicate_ids_resolve_to_first_state() {
        let record = AuthoringRecord::new()
            .state(StateDescriptor::new("Idle"))
            .state(StateDescriptor::new("Idle"))
            .transition("Idle", "Idle");

        let validated = validate_record(&record, &registry()).unwrap();

        assert_eq!(validated.states.len(), 2);
        assert_eq!(validated.transitions[0].from, Some(0));
        assert_eq!(validated.transitions[0].to, 0);
    }

    #[test]
    fn accumulates_every_fault() {
        let record = AuthoringRecord::new()
            .state(StateDescriptor::new("Patrol").with_params(json!({ "speed": "fast" })))
            .state(StateDescriptor::new("Fly"))
            .transition("Patrol", "Nowhere")
            .transition("Ghost", "Patrol")
            .weighted_transition(ANY, "Patrol", f32::NAN);

        let error = match validate_record(&record, &registry()) {
            Ok(_) => panic!("Expected compile errors"),
            Err(error) => error,
        };

        assert_eq!(error.errors.len(), 6);
        assert!(error
            .iter()
            .any(|e| matches!(e, AuthoringError::InvalidParams { kind, .. } if kind == "Patrol")));
        assert!(error
            .iter()
            .any(|e| matches!(e, AuthoringError::UnknownKind { kind } if kind == "Fly")));
        assert!(error.iter().any(|e| matches!(
            e,
            AuthoringError::MissingRequiredKind { required, .. } if required == "Idle"
        )));
        assert!(error.iter().any(|e| matches!(
            e,
            AuthoringError::UnknownState { endpoint: Endpoint::To, id, .. } if id == "Nowhere"
        )));
        assert!(error.iter().any(|e| matches!(
            e,
            AuthoringError::UnknownState { endpoint: Endpoint::From, id, .. } if id == "Ghost"
        )));
        assert!(error
            .iter()
            .any(|e| matches!(e, AuthoringError::InvalidProbability { index: 2 })));
    }

    #[test]
    fn present_requirement_passes() {
        let record = AuthoringRecord::new()
            .state(StateDescriptor::new("Patrol"))
            .state(StateDescriptor::new("Idle"));

        assert!(validate_record(&record, &registry()).is_ok());
    }
}

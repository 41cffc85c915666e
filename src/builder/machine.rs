//! Builder for constructing machines.

use crate::authoring::{AuthoringRecord, StateRegistry};
use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::State;
use crate::machine::{Machine, MachineConfig, StateKey};
use std::rc::Rc;

struct PendingState<E: 'static> {
    id: Option<String>,
    behavior: Box<dyn State<E>>,
}

/// Builder for constructing machines with a fluent API.
///
/// States from an authoring record are compiled first, then hand-added states
/// and transitions are layered on top. With an entity supplied the machine is
/// returned running; otherwise it waits for [`Machine::init`].
///
/// # Example
///
/// ```rust
/// use tickstate::builder::{MachineBuilder, TransitionBuilder};
/// use tickstate::core::State;
///
/// struct Npc;
///
/// struct Idle;
/// impl State<Npc> for Idle {}
///
/// struct Wander;
/// impl State<Npc> for Wander {}
///
/// let machine = MachineBuilder::new()
///     .start_state(Idle)
///     .state(Wander)
///     .transition(TransitionBuilder::new().from("Idle").to("Wander"))
///     .entity(Npc)
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.state_id(), Some("Idle"));
/// ```
pub struct MachineBuilder<E: 'static> {
    config: MachineConfig,
    entity: Option<Rc<E>>,
    record: Option<AuthoringRecord>,
    states: Vec<PendingState<E>>,
    start: Option<usize>,
    transitions: Vec<TransitionBuilder>,
}

impl<E: 'static> MachineBuilder<E> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
            entity: None,
            record: None,
            states: Vec::new(),
            start: None,
            transitions: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the probability rolls.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    /// Entity name used in log lines.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// Entity the machine drives; the machine starts during `build`.
    pub fn entity(mut self, entity: impl Into<Rc<E>>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Authoring record compiled during `build_with`.
    pub fn record(mut self, record: AuthoringRecord) -> Self {
        self.record = Some(record);
        self
    }

    /// Add a state under its kind name.
    pub fn state<S: State<E>>(mut self, state: S) -> Self {
        self.states.push(PendingState {
            id: None,
            behavior: Box::new(state),
        });
        self
    }

    /// Add a state under an explicit id.
    pub fn state_with_id<S: State<E>>(mut self, id: impl Into<String>, state: S) -> Self {
        self.states.push(PendingState {
            id: Some(id.into()),
            behavior: Box::new(state),
        });
        self
    }

    /// Add the entry state. A later call replaces the choice.
    pub fn start_state<S: State<E>>(mut self, state: S) -> Self {
        self.start = Some(self.states.len());
        self.state(state)
    }

    /// Add a transition.
    pub fn transition(mut self, builder: TransitionBuilder) -> Self {
        self.transitions.push(builder);
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, builders: impl IntoIterator<Item = TransitionBuilder>) -> Self {
        self.transitions.extend(builders);
        self
    }

    /// Build a machine from hand-added states only.
    pub fn build(self) -> Result<Machine<E>, BuildError> {
        self.build_with(&StateRegistry::new())
    }

    /// Build the machine, compiling the record against `registry`.
    ///
    /// The entry state is the explicit start state, else the record's first
    /// state, else the first hand-added state.
    pub fn build_with(self, registry: &StateRegistry<E>) -> Result<Machine<E>, BuildError> {
        let mut machine = Machine::with_config(self.config);
        if let Some(record) = self.record {
            machine.load_record(record);
            machine.compile_if_needed(registry)?;
        }

        let keys: Vec<StateKey> = self
            .states
            .into_iter()
            .map(|pending| machine.add_boxed(pending.id, pending.behavior, false))
            .collect();

        for builder in self.transitions {
            machine.add_transition(builder.build()?)?;
        }

        if let Some(index) = self.start {
            machine.set_entry_state(keys[index])?;
        } else if machine.entry_state().is_none() {
            let first = keys.first().copied().ok_or(BuildError::MissingEntryState)?;
            machine.set_entry_state(first)?;
        }

        if let Some(entity) = self.entity {
            machine.init(entity);
        }
        Ok(machine)
    }
}

impl<E: 'static> Default for MachineBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authoring::{StateDescriptor, StateKind};
    use crate::machine::MachineError;
    use serde::Deserialize;

    struct Npc;

    #[derive(Default, Deserialize)]
    struct Idle;
    impl State<Npc> for Idle {}
    impl StateKind<Npc> for Idle {
        const KIND: &'static str = "Idle";
    }

    struct Wander;
    impl State<Npc> for Wander {}

    #[test]
    fn builder_requires_an_entry_state() {
        let result = MachineBuilder::<Npc>::new().build();
        assert!(matches!(result, Err(BuildError::MissingEntryState)));
    }

    #[test]
    fn first_state_is_entry_by_default() {
        let machine = MachineBuilder::new()
            .state(Wander)
            .state(Idle)
            .entity(Npc)
            .build()
            .unwrap();

        assert_eq!(machine.state_id(), Some("Wander"));
    }

    #[test]
    fn machine_without_entity_waits_for_init() {
        let mut machine = MachineBuilder::new()
            .state(Wander)
            .start_state(Idle)
            .build()
            .unwrap();

        assert!(!machine.is_running());
        machine.init(Npc);
        assert_eq!(machine.state_id(), Some("Idle"));
    }

    #[test]
    fn unknown_transition_target_fails_build() {
        let result = MachineBuilder::new()
            .state(Idle)
            .transition(TransitionBuilder::new().from("Idle").to("Ghost"))
            .build();

        assert!(matches!(
            result,
            Err(BuildError::Machine(MachineError::UnknownState { .. }))
        ));
    }

    #[test]
    fn incomplete_transition_fails_build() {
        let result = MachineBuilder::new()
            .state(Idle)
            .transition(TransitionBuilder::new().to("Idle"))
            .build();

        assert!(matches!(result, Err(BuildError::MissingFromState)));
    }

    #[test]
    fn record_states_combine_with_hand_added_ones() {
        let record = AuthoringRecord::new().state(StateDescriptor::new("Idle"));
        let mut registry = StateRegistry::new();
        registry.register::<Idle>();

        let mut machine = MachineBuilder::new()
            .record(record)
            .state(Wander)
            .transitions([
                TransitionBuilder::new().from("Idle").to("Wander"),
                TransitionBuilder::new().from("Wander").to("Idle"),
            ])
            .entity(Npc)
            .seed(3)
            .build_with(&registry)
            .unwrap();

        assert_eq!(machine.state_id(), Some("Idle"));
        machine.force_complete();
        assert_eq!(machine.state_id(), Some("Wander"));
        assert_eq!(machine.config().rng_seed, Some(3));
    }

    #[test]
    fn record_without_registry_fails_compile() {
        let record = AuthoringRecord::new().state(StateDescriptor::new("Idle"));
        let result = MachineBuilder::<Npc>::new().record(record).build();

        assert!(matches!(result, Err(BuildError::Compile(_))));
    }
}

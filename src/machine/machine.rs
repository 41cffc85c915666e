//! The finite state machine runtime.

use super::config::{MachineConfig, PollPolicy};
use super::error::MachineError;
use super::transition::{Origin, StateKey, StateRef, Transition, TransitionSpec};
use crate::authoring::AuthoringRecord;
use crate::core::{
    elapsed_since, short_type_name, AsAny, CompletionSignal, Condition, Request, RequestSink, State,
    StateContext, StateHistory, TransitionCause, TransitionRecord,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use uuid::Uuid;

/// Machine-owned data of one registered state.
pub(super) struct StateSlot<E: 'static> {
    id: String,
    tag: String,
    behavior: Box<dyn State<E>>,
    entity: Weak<E>,
    signal: CompletionSignal,
    entered_at: Option<DateTime<Utc>>,
}

impl<E: 'static> StateSlot<E> {
    fn context(&self) -> StateContext<'_, E> {
        StateContext {
            id: &self.id,
            tag: &self.tag,
            entity: &self.entity,
            signal: &self.signal,
            entered_at: self.entered_at,
        }
    }
}

#[derive(Clone, Copy)]
enum Hook {
    Enter,
    Update,
    Exit,
}

#[derive(Clone, Copy)]
enum EdgeList {
    From(StateKey),
    Any,
}

/// Finite state machine driving one entity.
///
/// The machine owns every state, the compiled transition graph and the
/// currently active state. The driver calls [`update`](Self::update) once per
/// tick.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{State, StateContext};
/// use tickstate::Machine;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// struct Guard {
///     alarmed: Cell<bool>,
/// }
///
/// struct Patrol;
/// impl State<Guard> for Patrol {}
///
/// struct Chase;
/// impl State<Guard> for Chase {}
///
/// let guard = Rc::new(Guard { alarmed: Cell::new(false) });
/// let mut machine = Machine::new();
/// machine.add(Patrol, true);
/// machine.add(Chase, false);
///
/// let watched = Rc::clone(&guard);
/// machine
///     .add_conditional_transition("Patrol", "Chase", move || watched.alarmed.get())
///     .unwrap();
/// machine.init(Rc::clone(&guard));
///
/// machine.update();
/// assert_eq!(machine.state_id(), Some("Patrol"));
///
/// guard.alarmed.set(true);
/// machine.update();
/// assert_eq!(machine.state_id(), Some("Chase"));
/// ```
pub struct Machine<E: 'static> {
    pub(super) config: MachineConfig,
    pub(super) record: Option<AuthoringRecord>,
    pub(super) slots: Vec<StateSlot<E>>,
    pub(super) ids: HashMap<String, StateKey>,
    pub(super) kinds: HashMap<TypeId, Vec<StateKey>>,
    pub(super) transitions: HashMap<StateKey, Vec<Transition>>,
    pub(super) any_transitions: Vec<Transition>,
    pub(super) pending_start: Option<StateKey>,
    current: Option<StateKey>,
    entity: Option<Rc<E>>,
    initialized: bool,
    activation: u64,
    requests: RequestSink,
    rng: StdRng,
    history: StateHistory,
}

impl<E: 'static> Machine<E> {
    /// Create an empty machine with default configuration.
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    /// Create an empty machine.
    pub fn with_config(config: MachineConfig) -> Self {
        let rng = config
            .rng_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let history = StateHistory::with_limit(config.history_limit);
        Self {
            config,
            record: None,
            slots: Vec::new(),
            ids: HashMap::new(),
            kinds: HashMap::new(),
            transitions: HashMap::new(),
            any_transitions: Vec::new(),
            pending_start: None,
            current: None,
            entity: None,
            initialized: false,
            activation: 0,
            requests: RequestSink::default(),
            rng,
            history,
        }
    }

    /// Bind the entity up front; `init` and lazy initialization pick it up.
    pub fn with_entity(mut self, entity: impl Into<Rc<E>>) -> Self {
        self.bind_entity(entity.into());
        self
    }

    /// Store the authoring record consumed by
    /// [`compile_if_needed`](Self::compile_if_needed).
    pub fn with_record(mut self, record: AuthoringRecord) -> Self {
        self.load_record(record);
        self
    }

    /// Replace the stored authoring record.
    pub fn load_record(&mut self, record: AuthoringRecord) {
        self.record = Some(record);
    }

    /// Authoring record still waiting to be compiled or started.
    pub fn record(&self) -> Option<&AuthoringRecord> {
        self.record.as_ref()
    }

    /// Bind `entity` and activate the entry state.
    ///
    /// Does nothing while a state is active. The entity can only be bound
    /// before the first `init`; later calls keep the original one.
    pub fn init(&mut self, entity: impl Into<Rc<E>>) {
        if self.current.is_some() {
            if self.entity.is_none() {
                tracing::warn!(
                    entity = %self.label(),
                    "init ignored while a state is active; the entity was not bound"
                );
            } else {
                tracing::debug!(entity = %self.label(), "init ignored; machine is already running");
            }
            return;
        }
        self.bind_entity(entity.into());
        self.activate_pending();
    }

    /// Choose the state the next `init` activates.
    pub fn set_entry_state(&mut self, state: impl Into<StateRef>) -> Result<(), MachineError> {
        let key = self.resolve(&state.into())?;
        self.pending_start = Some(key);
        Ok(())
    }

    /// State waiting to be activated by `init`.
    pub fn entry_state(&self) -> Option<StateKey> {
        self.pending_start
    }

    fn bind_entity(&mut self, entity: Rc<E>) {
        if self.initialized {
            if let Some(bound) = &self.entity {
                if !Rc::ptr_eq(bound, &entity) {
                    tracing::warn!(
                        entity = %self.label(),
                        "entity is already bound; keeping the original"
                    );
                }
                return;
            }
        }
        let weak = Rc::downgrade(&entity);
        for slot in &mut self.slots {
            slot.entity = weak.clone();
        }
        self.entity = Some(entity);
    }

    fn activate_pending(&mut self) {
        self.initialized = true;
        match self.pending_start.take() {
            Some(start) => {
                self.set_state(start, TransitionCause::Start);
                self.record = None;
                self.drain_requests();
            }
            None => tracing::debug!(entity = %self.label(), "no entry state to activate"),
        }
    }

    /// Register `state` under its kind name, activating it if `is_start`.
    pub fn add<S: State<E>>(&mut self, state: S, is_start: bool) -> StateKey {
        self.add_boxed(None, Box::new(state), is_start)
    }

    /// Register `state` under an explicit id.
    pub fn add_with_id<S: State<E>>(
        &mut self,
        id: impl Into<String>,
        state: S,
        is_start: bool,
    ) -> StateKey {
        self.add_boxed(Some(id.into()), Box::new(state), is_start)
    }

    /// Register an already boxed state.
    ///
    /// A taken id is made unique by appending a generated suffix.
    pub fn add_boxed(
        &mut self,
        id: Option<String>,
        state: Box<dyn State<E>>,
        is_start: bool,
    ) -> StateKey {
        let requested = id.unwrap_or_else(|| state.kind().to_string());
        let key = self.insert(requested, None, state);
        if is_start {
            self.set_state(key, TransitionCause::Start);
            self.drain_requests();
        }
        key
    }

    pub(super) fn insert(
        &mut self,
        requested_id: String,
        tag: Option<String>,
        behavior: Box<dyn State<E>>,
    ) -> StateKey {
        let id = if self.ids.contains_key(&requested_id) {
            let unique = format!("{requested_id}-{}", Uuid::new_v4().simple());
            tracing::warn!(requested = %requested_id, assigned = %unique, "duplicate state id renamed");
            unique
        } else {
            requested_id
        };

        let tag = tag.unwrap_or_else(|| behavior.tag().to_string());
        let type_id = (*behavior).as_any().type_id();
        let entity = self.entity.as_ref().map(Rc::downgrade).unwrap_or_default();
        let key = StateKey(self.slots.len());

        self.slots.push(StateSlot {
            id: id.clone(),
            tag,
            behavior,
            entity,
            signal: CompletionSignal::detached(),
            entered_at: None,
        });
        self.ids.insert(id, key);
        self.kinds.entry(type_id).or_default().push(key);
        key
    }

    /// Add a transition.
    ///
    /// Fails with [`MachineError::UnknownState`] when either end names an
    /// unknown id; nothing is added in that case.
    pub fn add_transition(&mut self, spec: TransitionSpec) -> Result<&mut Self, MachineError> {
        let to = self.resolve(&spec.to)?;
        let from = match &spec.from {
            Origin::Any => None,
            Origin::State(state) => Some(self.resolve(state)?),
        };
        self.push_edge(from, Transition::new(to, spec.condition, spec.probability));
        Ok(self)
    }

    /// Add a transition taken when `from` signals completion.
    pub fn add_completion_transition(
        &mut self,
        from: impl Into<Origin>,
        to: impl Into<StateRef>,
    ) -> Result<&mut Self, MachineError> {
        self.add_transition(TransitionSpec::new(from, to))
    }

    /// Add a transition taken when `condition` holds during `update`.
    pub fn add_conditional_transition<F>(
        &mut self,
        from: impl Into<Origin>,
        to: impl Into<StateRef>,
        condition: F,
    ) -> Result<&mut Self, MachineError>
    where
        F: Fn() -> bool + 'static,
    {
        let mut spec = TransitionSpec::new(from, to);
        spec.condition = Some(Condition::new(condition));
        self.add_transition(spec)
    }

    pub(super) fn push_edge(&mut self, from: Option<StateKey>, transition: Transition) {
        match from {
            None => self.any_transitions.push(transition),
            Some(from) => self.transitions.entry(from).or_default().push(transition),
        }
    }

    fn resolve(&self, state: &StateRef) -> Result<StateKey, MachineError> {
        match state {
            StateRef::Id(id) => self
                .ids
                .get(id)
                .copied()
                .ok_or_else(|| MachineError::UnknownState { id: id.clone() }),
            StateRef::Key(key) if key.0 < self.slots.len() => Ok(*key),
            StateRef::Key(key) => Err(MachineError::UnknownKey { index: key.0 }),
        }
    }

    /// Run one tick.
    ///
    /// Polls the active state's conditional transitions, then runs
    /// `on_update` on whichever state is active afterwards. Without an active
    /// state the machine initializes itself if an entity is bound, and
    /// otherwise logs a warning.
    pub fn update(&mut self) {
        self.drain_requests();

        let Some(origin) = self.current else {
            if let Some(entity) = self.entity.clone() {
                self.bind_entity(entity);
                self.activate_pending();
            }
            if self.current.is_none() {
                tracing::warn!(entity = %self.label(), "update called with no active state");
            }
            return;
        };

        let count = self.edges(EdgeList::From(origin)).len();
        for index in 0..count {
            let target = {
                let edge = &self.edges(EdgeList::From(origin))[index];
                if !edge.poll() {
                    continue;
                }
                edge.to
            };
            if !self.guard_allows(target) {
                continue;
            }
            self.set_state(target, TransitionCause::Condition);
            if self.config.poll_policy == PollPolicy::FirstMatchWins {
                break;
            }
        }
        self.drain_requests();

        if let Some(current) = self.current {
            self.run_hook(current, Hook::Update);
        }
        self.drain_requests();
    }

    fn edges(&self, list: EdgeList) -> &[Transition] {
        match list {
            EdgeList::From(key) => self
                .transitions
                .get(&key)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            EdgeList::Any => &self.any_transitions,
        }
    }

    fn guard_allows(&self, target: StateKey) -> bool {
        let slot = &self.slots[target.0];
        slot.behavior.guard_check(&slot.context())
    }

    fn run_hook(&mut self, key: StateKey, hook: Hook) {
        let slot = &mut self.slots[key.0];
        let ctx = StateContext {
            id: &slot.id,
            tag: &slot.tag,
            entity: &slot.entity,
            signal: &slot.signal,
            entered_at: slot.entered_at,
        };
        match hook {
            Hook::Enter => slot.behavior.on_enter(&ctx),
            Hook::Update => slot.behavior.on_update(&ctx),
            Hook::Exit => slot.behavior.on_exit(&ctx),
        }
    }

    /// Exit the active state and enter `target`.
    fn set_state(&mut self, target: StateKey, cause: TransitionCause) {
        let previous = self.current.take();
        if let Some(previous) = previous {
            self.run_hook(previous, Hook::Exit);
            let slot = &mut self.slots[previous.0];
            slot.signal = CompletionSignal::detached();
            slot.entered_at = None;
        }

        self.activation += 1;
        self.current = Some(target);
        self.requests.set_live(self.activation);
        let now = Utc::now();
        {
            let slot = &mut self.slots[target.0];
            slot.entered_at = Some(now);
            slot.signal = CompletionSignal::attached(&self.requests, self.activation);
        }

        let slot = &self.slots[target.0];
        tracing::info!(
            state = %slot.behavior.kind(),
            id = %slot.id,
            entity = %self.label(),
            ?cause,
            "entered state"
        );
        self.history.record(TransitionRecord {
            from: previous.map(|key| self.slots[key.0].id.clone()),
            to: slot.id.clone(),
            cause,
            timestamp: now,
        });

        self.run_hook(target, Hook::Enter);
    }

    /// Process requests raised through completion signals.
    fn drain_requests(&mut self) {
        let limit = self.config.max_chained_completions.max(1);
        let mut processed = 0;
        loop {
            let Some(pending) = self.requests.take() else {
                return;
            };
            if processed >= limit {
                tracing::warn!(
                    entity = %self.label(),
                    limit,
                    "completion chain limit reached; deferring to the next update"
                );
                self.requests.put_back(pending);
                return;
            }
            processed += 1;

            if self.current.is_none() || pending.activation != self.activation {
                tracing::debug!(activation = pending.activation, "discarding stale state request");
                continue;
            }
            match pending.request {
                Request::Complete => self.set_next_state(),
                Request::Goto(id) => self.goto_requested(&id),
            }
        }
    }

    /// Follow the first qualifying completion transition.
    ///
    /// State-specific edges are scanned before wildcard edges. An edge
    /// qualifies when its condition (if any) holds, its target's guard
    /// passes, and its probability roll succeeds.
    fn set_next_state(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        let next = self
            .pick_successor(EdgeList::From(current))
            .or_else(|| self.pick_successor(EdgeList::Any));

        match next {
            Some(target) => self.set_state(target, TransitionCause::Completion),
            None => tracing::error!(
                entity = %self.label(),
                state = %self.slots[current.0].id,
                "no valid successor after completion; machine stays in state"
            ),
        }
    }

    fn pick_successor(&mut self, list: EdgeList) -> Option<StateKey> {
        let count = self.edges(list).len();
        for index in 0..count {
            let (target, probability) = {
                let edge = &self.edges(list)[index];
                if !edge.condition_allows() {
                    continue;
                }
                (edge.to, edge.probability)
            };
            if !self.guard_allows(target) {
                continue;
            }
            if !self.roll(probability) {
                tracing::trace!(probability, "probability roll skipped transition");
                continue;
            }
            return Some(target);
        }
        None
    }

    fn roll(&mut self, probability: f32) -> bool {
        probability >= 1.0 || self.rng.gen::<f32>() < probability
    }

    fn goto_requested(&mut self, id: &str) {
        match self.ids.get(id).copied() {
            Some(key) if Some(key) == self.current => {}
            Some(key) => self.set_state(key, TransitionCause::Requested),
            None => tracing::error!(
                entity = %self.label(),
                target_id = %id,
                "state requested an unknown successor"
            ),
        }
    }

    /// Switch to `state`, bypassing conditions and guards.
    ///
    /// Returns an error and changes nothing if the state is unknown. Forcing
    /// the active state is a successful no-op.
    pub fn force_state(&mut self, state: impl Into<StateRef>) -> Result<(), MachineError> {
        let key = self.resolve(&state.into())?;
        self.force_key(key);
        Ok(())
    }

    /// Switch to the first registered state of type `T`.
    pub fn force_state_of<T: State<E>>(&mut self) -> Result<(), MachineError> {
        let key = self
            .first_of::<T>()
            .ok_or_else(|| MachineError::NoStateOfKind {
                kind: short_type_name(type_name::<T>()).to_string(),
            })?;
        self.force_key(key);
        Ok(())
    }

    fn force_key(&mut self, key: StateKey) {
        if self.current == Some(key) {
            return;
        }
        self.set_state(key, TransitionCause::Forced);
        self.drain_requests();
    }

    /// Fire the active state's completion signal.
    ///
    /// Returns `false` when no state is active.
    pub fn force_complete(&mut self) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        self.slots[current.0].signal.complete();
        self.drain_requests();
        true
    }

    /// Exit the active state and stop. Calling it again does nothing.
    pub fn dispose(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        self.run_hook(current, Hook::Exit);
        self.requests.set_live(0);
        self.requests.take();
        let slot = &mut self.slots[current.0];
        slot.signal = CompletionSignal::detached();
        slot.entered_at = None;
        tracing::info!(entity = %self.label(), id = %self.slots[current.0].id, "machine disposed");
    }

    fn first_of<T: State<E>>(&self) -> Option<StateKey> {
        self.kinds
            .get(&TypeId::of::<T>())
            .and_then(|keys| keys.first())
            .copied()
    }

    /// First registered state of type `T`.
    pub fn get_state<T: State<E>>(&self) -> Option<&T> {
        let key = self.first_of::<T>()?;
        (*self.slots[key.0].behavior).as_any().downcast_ref::<T>()
    }

    /// Mutable access to the first registered state of type `T`.
    pub fn get_state_mut<T: State<E>>(&mut self) -> Option<&mut T> {
        let key = self.first_of::<T>()?;
        (*self.slots[key.0].behavior).as_any_mut().downcast_mut::<T>()
    }

    /// Whether the active state carries `tag`.
    pub fn compare_tag(&self, tag: &str) -> bool {
        self.active_slot().is_some_and(|slot| slot.tag == tag)
    }

    fn active_slot(&self) -> Option<&StateSlot<E>> {
        self.current.map(|key| &self.slots[key.0])
    }

    /// Id of the active state.
    pub fn state_id(&self) -> Option<&str> {
        self.active_slot().map(|slot| slot.id.as_str())
    }

    /// Tag of the active state.
    pub fn state_tag(&self) -> Option<&str> {
        self.active_slot().map(|slot| slot.tag.as_str())
    }

    /// Class (kind) name of the active state.
    pub fn state_class(&self) -> Option<&str> {
        self.active_slot().map(|slot| slot.behavior.kind())
    }

    /// Time spent in the active state.
    pub fn state_time(&self) -> Option<Duration> {
        self.active_slot()
            .and_then(|slot| slot.entered_at)
            .map(elapsed_since)
    }

    /// Key of the active state.
    pub fn current_key(&self) -> Option<StateKey> {
        self.current
    }

    /// Whether a state is active.
    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Key of the state registered under `id`.
    pub fn key_of(&self, id: &str) -> Option<StateKey> {
        self.ids.get(id).copied()
    }

    /// Whether a state is registered under `id`.
    pub fn contains_state(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Ids of all states in registration order.
    pub fn state_ids(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.id.as_str())
    }

    /// Number of registered states.
    pub fn state_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of edges leaving `from` (wildcard edges excluded).
    pub fn transition_count(&self, from: &str) -> usize {
        self.key_of(from)
            .map_or(0, |key| self.edges(EdgeList::From(key)).len())
    }

    /// Number of wildcard edges.
    pub fn any_transition_count(&self) -> usize {
        self.any_transitions.len()
    }

    /// The bound entity, if any.
    pub fn entity(&self) -> Option<&Rc<E>> {
        self.entity.as_ref()
    }

    /// Journal of recent state changes.
    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Configuration the machine was created with.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Name of the entity in log lines.
    pub fn label(&self) -> &str {
        self.config
            .label
            .as_deref()
            .unwrap_or_else(|| short_type_name(type_name::<E>()))
    }
}

impl<E: 'static> Default for Machine<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> fmt::Debug for Machine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("entity", &self.label())
            .field("state", &self.state_id())
            .field("states", &self.slots.len())
            .field("any_transitions", &self.any_transitions.len())
            .finish()
    }
}

//! Kind registry used to instantiate authored states.

use crate::core::State;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A state type that can be named in an authoring record.
///
/// `Default` builds the state when the descriptor carries no `params`;
/// `Deserialize` builds it from the `params` object otherwise. Implement it
/// by hand or with [`state_kind!`](crate::state_kind).
///
/// # Example
///
/// ```rust
/// use tickstate::authoring::{StateKind, StateRegistry};
/// use tickstate::core::State;
/// use serde::Deserialize;
///
/// struct Npc;
///
/// #[derive(Default, Deserialize)]
/// struct Patrol {
///     #[serde(default)]
///     speed: f32,
/// }
///
/// impl State<Npc> for Patrol {}
///
/// impl StateKind<Npc> for Patrol {
///     const KIND: &'static str = "Patrol";
///     const GROUP: Option<&'static str> = Some("Movement");
/// }
///
/// let mut registry = StateRegistry::<Npc>::new();
/// registry.register::<Patrol>();
/// assert!(registry.contains("Patrol"));
/// ```
pub trait StateKind<E: 'static>: State<E> + Default + DeserializeOwned + 'static {
    /// Name used by the `type` field of a state descriptor.
    const KIND: &'static str;

    /// Menu group an authoring tool files this kind under.
    const GROUP: Option<&'static str> = None;

    /// Kinds that must also be present in any record using this kind.
    const REQUIRES: &'static [&'static str] = &[];
}

/// Builds a boxed state from optional descriptor params.
pub type StateFactory<E> = Box<dyn Fn(Option<&Value>) -> Result<Box<dyn State<E>>, String>>;

struct KindEntry<E: 'static> {
    group: Option<&'static str>,
    requires: &'static [&'static str],
    factory: StateFactory<E>,
}

/// Maps kind names to state factories and authoring metadata.
pub struct StateRegistry<E: 'static> {
    kinds: BTreeMap<String, KindEntry<E>>,
}

impl<E: 'static> StateRegistry<E> {
    pub fn new() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Register a [`StateKind`]. Re-registering a kind replaces it.
    pub fn register<T: StateKind<E>>(&mut self) -> &mut Self {
        let factory: StateFactory<E> = Box::new(|params| match params {
            None => Ok(Box::new(T::default()) as Box<dyn State<E>>),
            Some(value) => serde_json::from_value::<T>(value.clone())
                .map(|state| Box::new(state) as Box<dyn State<E>>)
                .map_err(|e| e.to_string()),
        });
        self.register_with(T::KIND, T::GROUP, T::REQUIRES, factory)
    }

    /// Register a kind with a hand-written factory.
    pub fn register_with(
        &mut self,
        kind: impl Into<String>,
        group: Option<&'static str>,
        requires: &'static [&'static str],
        factory: StateFactory<E>,
    ) -> &mut Self {
        let kind = kind.into();
        if self.kinds.contains_key(&kind) {
            tracing::debug!(kind = %kind, "replacing registered state kind");
        }
        self.kinds.insert(
            kind,
            KindEntry {
                group,
                requires,
                factory,
            },
        );
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Group a kind was registered under.
    pub fn group_of(&self, kind: &str) -> Option<&'static str> {
        self.kinds.get(kind).and_then(|entry| entry.group)
    }

    /// Kinds a kind depends on; empty for unknown kinds.
    pub fn requirements_of(&self, kind: &str) -> &'static [&'static str] {
        self.kinds.get(kind).map(|entry| entry.requires).unwrap_or(&[])
    }

    /// Grouped kinds for an authoring menu, ungrouped kinds left out.
    pub fn groups(&self) -> BTreeMap<&'static str, Vec<&str>> {
        let mut groups: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
        for (kind, entry) in &self.kinds {
            if let Some(group) = entry.group {
                groups.entry(group).or_default().push(kind.as_str());
            }
        }
        groups
    }

    /// Build a state of `kind`. `None` when the kind is unknown.
    pub(crate) fn instantiate(
        &self,
        kind: &str,
        params: Option<&Value>,
    ) -> Option<Result<Box<dyn State<E>>, String>> {
        self.kinds.get(kind).map(|entry| (entry.factory)(params))
    }
}

impl<E: 'static> Default for StateRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> fmt::Debug for StateRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRegistry")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}

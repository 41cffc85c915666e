//! Declarative authoring records.
//!
//! An [`AuthoringRecord`] is the flat, serializable description of a machine
//! produced by an editing tool: an ordered list of state descriptors (the
//! first one is the entry state) and a list of transitions between state ids.
//! Records are turned into a runtime graph once, by
//! [`Machine::compile_if_needed`](crate::Machine::compile_if_needed), using a
//! [`StateRegistry`] to instantiate each state kind.
//!
//! # Format
//!
//! ```json
//! {
//!   "states": [
//!     { "type": "Idle" },
//!     { "type": "Patrol", "id": "patrol_north", "params": { "speed": 2.0 } },
//!     { "type": "Alarm", "tag": "hostile" }
//!   ],
//!   "transitions": [
//!     { "from": "Idle", "to": "patrol_north" },
//!     { "from": "Any", "to": "Alarm", "probability": 0.25 }
//!   ]
//! }
//! ```

pub mod error;
pub mod registry;
mod validate;

pub use error::{AuthoringError, CompileError, Endpoint};
pub use registry::{StateKind, StateRegistry};
pub(crate) use validate::{validate_record, ValidatedRecord};

use serde::{Deserialize, Serialize};

/// Reserved `from` value for wildcard transitions.
pub const ANY: &str = "Any";

/// One state of an authoring record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateDescriptor {
    /// Registered kind name
    #[serde(rename = "type")]
    pub kind: String,

    /// Explicit id; defaults to the kind name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Tag override; defaults to the state's own tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Kind-specific settings; the kind's `Default` is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl StateDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            tag: None,
            params: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Id the descriptor asks for before collision handling.
    pub fn requested_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.kind)
    }
}

fn default_probability() -> f32 {
    1.0
}

/// One transition of an authoring record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionDescriptor {
    /// Origin state id, or [`ANY`]
    pub from: String,

    /// Target state id
    pub to: String,

    /// Chance of being taken when it qualifies, clamped to `[0, 1]`
    #[serde(default = "default_probability")]
    pub probability: f32,
}

impl TransitionDescriptor {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            probability: default_probability(),
        }
    }

    pub fn with_probability(mut self, probability: f32) -> Self {
        self.probability = probability;
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.from == ANY
    }
}

/// Declarative description of a machine, consumed once by the compiler.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthoringRecord {
    #[serde(default)]
    pub states: Vec<StateDescriptor>,

    #[serde(default)]
    pub transitions: Vec<TransitionDescriptor>,
}

impl AuthoringRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the record to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Append a state descriptor.
    pub fn state(mut self, descriptor: StateDescriptor) -> Self {
        self.states.push(descriptor);
        self
    }

    /// Append a transition with probability 1.
    pub fn transition(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.transitions.push(TransitionDescriptor::new(from, to));
        self
    }

    /// Append a transition with an explicit probability.
    pub fn weighted_transition(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        probability: f32,
    ) -> Self {
        self.transitions
            .push(TransitionDescriptor::new(from, to).with_probability(probability));
        self
    }

    /// The descriptor of the entry state.
    pub fn entry(&self) -> Option<&StateDescriptor> {
        self.states.first()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_authoring_format() {
        let record = AuthoringRecord::from_json(
            r#"{
                "states": [
                    { "type": "Idle" },
                    { "type": "Patrol", "id": "north", "params": { "speed": 2.0 } }
                ],
                "transitions": [
                    { "from": "Idle", "to": "north" },
                    { "from": "Any", "to": "Idle", "probability": 0.5 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(record.entry().unwrap().kind, "Idle");
        assert_eq!(record.states[1].requested_id(), "north");
        assert_eq!(record.states[1].params, Some(json!({ "speed": 2.0 })));
        assert_eq!(record.transitions[0].probability, 1.0);
        assert!(record.transitions[1].is_wildcard());
        assert_eq!(record.transitions[1].probability, 0.5);
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let record = AuthoringRecord::from_json("{}").unwrap();
        assert!(record.is_empty());
        assert!(record.entry().is_none());
    }

    #[test]
    fn builder_methods_match_parsed_form() {
        let built = AuthoringRecord::new()
            .state(StateDescriptor::new("Idle"))
            .state(StateDescriptor::new("Alarm").with_tag("hostile"))
            .transition("Idle", "Alarm")
            .weighted_transition(ANY, "Idle", 0.1);

        let json = built.to_json().unwrap();
        let parsed = AuthoringRecord::from_json(&json).unwrap();

        assert_eq!(parsed, built);
    }

    #[test]
    fn requested_id_defaults_to_kind() {
        assert_eq!(StateDescriptor::new("Chase").requested_id(), "Chase");
        assert_eq!(
            StateDescriptor::new("Chase").with_id("chase_2").requested_id(),
            "chase_2"
        );
    }
}

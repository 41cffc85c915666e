//! Machine configuration.

use serde::{Deserialize, Serialize};

/// How `update` treats several polled conditions that hold in one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPolicy {
    /// Evaluate every edge; each match switches state, so the last one wins.
    #[default]
    LastMatchWins,
    /// Stop at the first matching edge.
    FirstMatchWins,
}

/// Tunables for a [`Machine`](crate::Machine).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use tickstate::{MachineConfig, PollPolicy};
///
/// let config = MachineConfig::from_json(r#"{ "poll_policy": "first_match_wins" }"#).unwrap();
/// assert_eq!(config.poll_policy, PollPolicy::FirstMatchWins);
/// assert_eq!(config.history_limit, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Polled-transition precedence
    pub poll_policy: PollPolicy,

    /// Transition records kept in the journal; 0 disables it
    pub history_limit: usize,

    /// Completion requests processed back to back before the machine
    /// defers the rest to the next tick
    pub max_chained_completions: usize,

    /// Seed for probability rolls; entropy when absent
    pub rng_seed: Option<u64>,

    /// Entity name used in log lines; the entity type name when absent
    pub label: Option<String>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            poll_policy: PollPolicy::default(),
            history_limit: 64,
            max_chained_completions: 32,
            rng_seed: None,
            label: None,
        }
    }
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_last_match_wins() {
        let config = MachineConfig::default();
        assert_eq!(config.poll_policy, PollPolicy::LastMatchWins);
        assert_eq!(config.max_chained_completions, 32);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(MachineConfig::from_json("{}").unwrap(), MachineConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = MachineConfig::from_json(
            r#"{ "history_limit": 0, "rng_seed": 9, "label": "guard_04" }"#,
        )
        .unwrap();

        assert_eq!(config.history_limit, 0);
        assert_eq!(config.rng_seed, Some(9));
        assert_eq!(config.label.as_deref(), Some("guard_04"));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(MachineConfig::from_json(r#"{ "poll_policy": "random" }"#).is_err());
    }
}

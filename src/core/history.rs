//! Transition journal.
//!
//! The machine records every state change it performs into a bounded
//! history, oldest entries dropped first. The journal is diagnostic only;
//! nothing in the machine reads it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Why the machine changed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// Entry state activated by `init` or `add(.., true)`.
    Start,
    /// A polled condition held during `update`.
    Condition,
    /// The active state signalled completion.
    Completion,
    /// The driver called `force_state`.
    Forced,
    /// The active state asked for a specific successor.
    Requested,
}

/// Record of a single state change.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{TransitionCause, TransitionRecord};
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from: Some("Patrol".to_string()),
///     to: "Chase".to_string(),
///     cause: TransitionCause::Condition,
///     timestamp: Utc::now(),
/// };
/// assert_eq!(record.to, "Chase");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Id of the state left, `None` when nothing was active
    pub from: Option<String>,
    /// Id of the state entered
    pub to: String,
    /// What triggered the change
    pub cause: TransitionCause,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered history of state changes.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{StateHistory, TransitionCause, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(2);
/// for (from, to) in [(None, "A"), (Some("A"), "B"), (Some("B"), "C")] {
///     history.record(TransitionRecord {
///         from: from.map(str::to_string),
///         to: to.to_string(),
///         cause: TransitionCause::Forced,
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.get_path(), vec!["A", "B", "C"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    records: VecDeque<TransitionRecord>,
    limit: usize,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::with_limit(64)
    }
}

impl StateHistory {
    /// Create an empty history keeping at most `limit` records.
    ///
    /// A limit of zero disables recording.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit.min(256)),
            limit,
        }
    }

    /// Append a record, evicting the oldest one when full.
    pub fn record(&mut self, record: TransitionRecord) {
        if self.limit == 0 {
            return;
        }
        while self.records.len() >= self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Ids of the states traversed, oldest first.
    ///
    /// Starts with the `from` of the oldest record when there is one.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(from) = self.records.front().and_then(|r| r.from.as_deref()) {
            path.push(from);
        }
        for record in &self.records {
            path.push(record.to.as_str());
        }
        path
    }

    /// Time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(from: Option<&str>, to: &str, cause: TransitionCause) -> TransitionRecord {
        TransitionRecord {
            from: from.map(str::to_string),
            to: to.to_string(),
            cause,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::default();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert_eq!(history.limit(), 64);
    }

    #[test]
    fn path_follows_recorded_order() {
        let mut history = StateHistory::default();
        history.record(record(None, "Idle", TransitionCause::Start));
        history.record(record(Some("Idle"), "Patrol", TransitionCause::Completion));
        history.record(record(Some("Patrol"), "Chase", TransitionCause::Condition));

        assert_eq!(history.get_path(), vec!["Idle", "Patrol", "Chase"]);
        assert_eq!(history.last().unwrap().cause, TransitionCause::Condition);
    }

    #[test]
    fn oldest_records_are_evicted() {
        let mut history = StateHistory::with_limit(2);
        history.record(record(None, "A", TransitionCause::Start));
        history.record(record(Some("A"), "B", TransitionCause::Forced));
        history.record(record(Some("B"), "C", TransitionCause::Forced));

        let targets: Vec<_> = history.records().map(|r| r.to.as_str()).collect();
        assert_eq!(targets, vec!["B", "C"]);
    }

    #[test]
    fn zero_limit_disables_recording() {
        let mut history = StateHistory::with_limit(0);
        history.record(record(None, "A", TransitionCause::Start));
        assert!(history.is_empty());
    }

    #[test]
    fn duration_spans_retained_records() {
        let start = Utc::now();
        let mut history = StateHistory::default();
        history.record(TransitionRecord {
            timestamp: start,
            ..record(None, "A", TransitionCause::Start)
        });
        history.record(TransitionRecord {
            timestamp: start + chrono::Duration::milliseconds(250),
            ..record(Some("A"), "B", TransitionCause::Completion)
        });

        assert_eq!(history.duration(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::with_limit(8);
        history.record(record(None, "Idle", TransitionCause::Start));

        let json = serde_json::to_string(&history).unwrap();
        let restored: StateHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(restored.limit(), 8);
        assert_eq!(restored.last(), history.last());
    }
}

//! Turning an authoring record into a runtime graph.

use super::machine::Machine;
use super::transition::{StateKey, Transition};
use crate::authoring::{validate_record, CompileError, StateRegistry};

impl<E: 'static> Machine<E> {
    /// Compile the stored authoring record into states and transitions.
    ///
    /// Returns `Ok(false)` without touching anything when the machine already
    /// holds states or no record is loaded. Every fault in the record is
    /// reported at once; on error the machine is left empty. On success the
    /// first descriptor becomes the entry state activated by `init`.
    pub fn compile_if_needed(&mut self, registry: &StateRegistry<E>) -> Result<bool, CompileError> {
        if !self.slots.is_empty() {
            tracing::debug!(states = self.slots.len(), "graph already built; skipping compile");
            return Ok(false);
        }
        let Some(record) = self.record.as_ref() else {
            return Ok(false);
        };

        let validated = match validate_record(record, registry) {
            Ok(validated) => validated,
            Err(error) => {
                tracing::error!(
                    entity = %self.label(),
                    errors = error.errors.len(),
                    "authoring record rejected: {}",
                    error
                );
                return Err(error);
            }
        };

        let keys: Vec<StateKey> = validated
            .states
            .into_iter()
            .map(|state| self.insert(state.requested_id, state.tag, state.behavior))
            .collect();

        for edge in &validated.transitions {
            let from = edge.from.map(|index| keys[index]);
            self.push_edge(from, Transition::new(keys[edge.to], None, edge.probability));
        }

        self.pending_start = keys.first().copied();
        tracing::info!(
            entity = %self.label(),
            states = keys.len(),
            transitions = validated.transitions.len(),
            "compiled authoring record"
        );
        Ok(true)
    }
}

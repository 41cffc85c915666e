//! Build errors for machine and transition builders.

use crate::authoring::CompileError;
use crate::machine::MachineError;
use thiserror::Error;

/// Errors that can occur when building machines and transitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No entry state. Call .start_state(state), add a state, or supply a record")]
    MissingEntryState,

    #[error("Transition source not specified. Call .from(state) or .from_any()")]
    MissingFromState,

    #[error("Transition target not specified. Call .to(state)")]
    MissingToState,

    #[error("Transition probability {value} is outside [0, 1]")]
    InvalidProbability { value: f32 },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Machine(#[from] MachineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_message() {
        let inner = MachineError::UnknownState {
            id: "Ghost".to_string(),
        };
        let message = inner.to_string();
        let error: BuildError = inner.into();

        assert!(matches!(error, BuildError::Machine(_)));
        assert_eq!(error.to_string(), message);
    }
}

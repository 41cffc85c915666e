//! Misuse errors reported by the machine.

use thiserror::Error;

/// Errors returned by machine operations.
///
/// None of these leave the machine unusable; the operation that failed
/// simply had no effect.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    #[error("No state with id '{id}'")]
    UnknownState { id: String },

    #[error("No state at key {index}")]
    UnknownKey { index: usize },

    #[error("No state of kind '{kind}' is registered")]
    NoStateOfKind { kind: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_missing_state() {
        let err = MachineError::UnknownState {
            id: "NoSuchId".to_string(),
        };
        assert_eq!(err.to_string(), "No state with id 'NoSuchId'");

        let err = MachineError::NoStateOfKind {
            kind: "Flee".to_string(),
        };
        assert_eq!(err.to_string(), "No state of kind 'Flee' is registered");
    }
}

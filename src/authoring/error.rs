//! Authoring and compile errors.

use thiserror::Error;

/// Which end of a transition descriptor an id came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    From,
    To,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::From => f.write_str("from"),
            Self::To => f.write_str("to"),
        }
    }
}

/// A single fault found in an authoring record.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthoringError {
    #[error("State kind '{kind}' is not registered")]
    UnknownKind { kind: String },

    #[error("Invalid params for state '{id}' of kind '{kind}': {message}")]
    InvalidParams {
        id: String,
        kind: String,
        message: String,
    },

    #[error("Transition #{index} '{endpoint}' references unknown state '{id}'")]
    UnknownState {
        index: usize,
        endpoint: Endpoint,
        id: String,
    },

    #[error("Transition #{index} has a non-numeric probability")]
    InvalidProbability { index: usize },

    #[error("State kind '{kind}' requires a '{required}' state in the same machine")]
    MissingRequiredKind { kind: String, required: String },
}

/// Every fault found while compiling one authoring record.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Authoring record has {} error(s); first: {}", .errors.len(), first_message(.errors))]
pub struct CompileError {
    pub errors: Vec<AuthoringError>,
}

fn first_message(errors: &[AuthoringError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl CompileError {
    pub fn iter(&self) -> impl Iterator<Item = &AuthoringError> {
        self.errors.iter()
    }
}

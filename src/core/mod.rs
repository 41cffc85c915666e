//! Core state machine types.
//!
//! This module contains the building blocks the machine is assembled from:
//! - The `State` trait implemented by every behavior
//! - The `StateContext` a hook sees while it runs
//! - The rebindable `CompletionSignal`
//! - Polled transition `Condition`s
//! - The bounded transition journal

mod condition;
mod context;
mod history;
mod signal;
mod state;

pub use condition::Condition;
pub use context::StateContext;
pub(crate) use context::elapsed_since;
pub use history::{StateHistory, TransitionCause, TransitionRecord};
pub use signal::CompletionSignal;
pub(crate) use signal::{Request, RequestSink};
pub use state::{short_type_name, AsAny, State};

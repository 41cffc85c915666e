//! Runtime state machine: graph construction, ticking and explicit control.

mod compile;
pub mod config;
pub mod error;
#[allow(clippy::module_inception)]
mod machine;
pub mod transition;

pub use config::{MachineConfig, PollPolicy};
pub use error::MachineError;
pub use machine::Machine;
pub use transition::{Origin, StateKey, StateRef, TransitionSpec};

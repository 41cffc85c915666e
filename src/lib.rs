//! Tickstate: a data-driven finite state machine runtime for game entities
//!
//! A [`Machine`] owns a set of behavior states for one entity, activates
//! exactly one of them at a time and ticks it once per frame. States move on
//! in two ways: conditional transitions polled every tick, and completion
//! transitions taken when the active state signals that it is done.
//!
//! # Core Concepts
//!
//! - **State**: Behavior unit implementing the [`State`] trait hooks
//! - **Transitions**: Conditional, completion, wildcard and weighted edges
//! - **Completion signal**: Handle a state uses to ask the machine to move on
//! - **Authoring record**: Serializable machine description compiled once
//!
//! # Example
//!
//! ```rust
//! use tickstate::core::{State, StateContext};
//! use tickstate::Machine;
//!
//! struct Sentry;
//!
//! struct Watch;
//! impl State<Sentry> for Watch {
//!     fn on_update(&mut self, ctx: &StateContext<'_, Sentry>) {
//!         ctx.complete();
//!     }
//! }
//!
//! struct Report;
//! impl State<Sentry> for Report {}
//!
//! let mut machine = Machine::new();
//! machine.add(Watch, false);
//! machine.add(Report, false);
//! machine.add_completion_transition("Watch", "Report").unwrap();
//! machine.set_entry_state("Watch").unwrap();
//! machine.init(Sentry);
//!
//! machine.update();
//! assert_eq!(machine.state_id(), Some("Report"));
//! ```

pub mod authoring;
pub mod builder;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use authoring::{AuthoringRecord, CompileError, StateKind, StateRegistry};
pub use builder::{BuildError, MachineBuilder, TransitionBuilder};
pub use core::{CompletionSignal, State, StateContext, StateHistory};
pub use machine::{
    Machine, MachineConfig, MachineError, Origin, PollPolicy, StateKey, StateRef, TransitionSpec,
};

//! Core State trait for machine-driven behaviors.
//!
//! A state is a behavior unit with enter/update/exit hooks, an optional
//! guard, and a tag. The machine owns every state for its whole lifetime and
//! hands each hook a [`StateContext`] describing the current activation.

use super::context::StateContext;
use std::any::{type_name, Any};

/// Object-safe access to the concrete type behind a `dyn State<E>`.
///
/// Implemented for every `'static` type, so state implementors never write
/// it by hand. Used by the machine's typed lookups.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Trait for machine states.
///
/// `E` is the entity type the machine drives. Every hook has a default
/// no-op implementation, so a state only overrides what it needs.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{State, StateContext};
/// use std::cell::Cell;
///
/// struct Npc {
///     stamina: Cell<u32>,
/// }
///
/// #[derive(Default)]
/// struct Rest;
///
/// impl State<Npc> for Rest {
///     fn on_update(&mut self, ctx: &StateContext<'_, Npc>) {
///         if let Some(npc) = ctx.entity() {
///             npc.stamina.set(npc.stamina.get() + 1);
///             if npc.stamina.get() >= 10 {
///                 ctx.complete();
///             }
///         }
///     }
///
///     fn tag(&self) -> &str {
///         "idle"
///     }
/// }
///
/// assert_eq!(State::<Npc>::kind(&Rest), "Rest");
/// ```
pub trait State<E: 'static>: AsAny {
    /// Called once when the state becomes active.
    fn on_enter(&mut self, _ctx: &StateContext<'_, E>) {}

    /// Called once per tick while the state is active.
    fn on_update(&mut self, _ctx: &StateContext<'_, E>) {}

    /// Called once when the state stops being active.
    fn on_exit(&mut self, _ctx: &StateContext<'_, E>) {}

    /// Decide whether this state may be entered.
    ///
    /// Evaluated on the *candidate* target before a polled or completion
    /// transition enters it. Forced transitions skip it.
    fn guard_check(&self, _ctx: &StateContext<'_, E>) -> bool {
        true
    }

    /// Coarse classification used by [`Machine::compare_tag`](crate::Machine::compare_tag).
    fn tag(&self) -> &str {
        ""
    }

    /// Name of the concrete state class.
    ///
    /// Used as the default id and reported by
    /// [`Machine::state_class`](crate::Machine::state_class). Defaults to the
    /// unqualified Rust type name.
    fn kind(&self) -> &str {
        short_type_name(type_name::<Self>())
    }
}

/// Strip module path and generic arguments from a type name.
///
/// `my_game::ai::Patrol<my_game::Npc>` becomes `Patrol`.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entity;

    #[derive(Default)]
    struct Patrol;

    impl State<Entity> for Patrol {}

    struct Tagged;

    impl State<Entity> for Tagged {
        fn tag(&self) -> &str {
            "combat"
        }

        fn kind(&self) -> &str {
            "Attack"
        }
    }

    struct Generic<T>(T);

    impl<T: 'static> State<Entity> for Generic<T> {}

    #[test]
    fn kind_defaults_to_short_type_name() {
        assert_eq!(State::<Entity>::kind(&Patrol), "Patrol");
        assert_eq!(State::<Entity>::kind(&Generic(3u8)), "Generic");
    }

    #[test]
    fn kind_and_tag_can_be_overridden() {
        assert_eq!(State::<Entity>::kind(&Tagged), "Attack");
        assert_eq!(State::<Entity>::tag(&Tagged), "combat");
        assert_eq!(State::<Entity>::tag(&Patrol), "");
    }

    #[test]
    fn short_type_name_strips_paths_and_generics() {
        assert_eq!(short_type_name("a::b::Patrol"), "Patrol");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn boxed_state_downcasts_to_concrete_type() {
        let boxed: Box<dyn State<Entity>> = Box::new(Patrol);
        assert!((*boxed).as_any().downcast_ref::<Patrol>().is_some());
        assert!((*boxed).as_any().downcast_ref::<Tagged>().is_none());
    }
}

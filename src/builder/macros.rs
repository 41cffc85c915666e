//! Macros for declaring authorable state kinds.

/// Implement [`StateKind`](crate::authoring::StateKind) for a state type.
///
/// The kind name defaults to the type name. The type still needs its own
/// `State`, `Default` and `Deserialize` implementations.
///
/// # Example
///
/// ```
/// use tickstate::core::State;
/// use tickstate::state_kind;
/// use serde::Deserialize;
///
/// pub struct Npc;
///
/// #[derive(Default, Deserialize)]
/// pub struct Patrol {
///     #[serde(default)]
///     speed: f32,
/// }
///
/// impl State<Npc> for Patrol {}
///
/// state_kind!(Patrol => Npc, group = "Movement", requires = ["Idle"]);
/// ```
#[macro_export]
macro_rules! state_kind {
    (@kind $state:ty) => {
        stringify!($state)
    };
    (@kind $state:ty, $kind:expr) => {
        $kind
    };
    (
        $state:ty => $entity:ty
        $(, kind = $kind:expr)?
        $(, group = $group:expr)?
        $(, requires = [$($required:expr),* $(,)?])?
        $(,)?
    ) => {
        impl $crate::authoring::StateKind<$entity> for $state {
            const KIND: &'static str = $crate::state_kind!(@kind $state $(, $kind)?);
            $(const GROUP: Option<&'static str> = Some($group);)?
            $(const REQUIRES: &'static [&'static str] = &[$($required),*];)?
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::authoring::{StateKind, StateRegistry};
    use crate::core::State;
    use serde::Deserialize;

    struct Npc;

    #[derive(Default, Deserialize)]
    struct Idle;
    impl State<Npc> for Idle {}

    #[derive(Default, Deserialize)]
    struct Patrol;
    impl State<Npc> for Patrol {}

    #[derive(Default, Deserialize)]
    struct Alarm;
    impl State<Npc> for Alarm {}

    state_kind!(Idle => Npc);
    state_kind!(Patrol => Npc, group = "Movement", requires = ["Idle"]);
    state_kind!(Alarm => Npc, kind = "RaiseAlarm", group = "Combat");

    #[test]
    fn kind_defaults_to_type_name() {
        assert_eq!(<Idle as StateKind<Npc>>::KIND, "Idle");
        assert_eq!(<Idle as StateKind<Npc>>::GROUP, None);
        assert!(<Idle as StateKind<Npc>>::REQUIRES.is_empty());
    }

    #[test]
    fn metadata_is_forwarded() {
        assert_eq!(<Patrol as StateKind<Npc>>::GROUP, Some("Movement"));
        assert_eq!(<Patrol as StateKind<Npc>>::REQUIRES, &["Idle"]);
        assert_eq!(<Alarm as StateKind<Npc>>::KIND, "RaiseAlarm");
    }

    #[test]
    fn macro_kinds_register() {
        let mut registry = StateRegistry::<Npc>::new();
        registry
            .register::<Idle>()
            .register::<Patrol>()
            .register::<Alarm>();

        assert!(registry.contains("RaiseAlarm"));
        assert_eq!(registry.groups()["Combat"], vec!["RaiseAlarm"]);
    }
}

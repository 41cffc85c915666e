//! Polled transition conditions.
//!
//! A condition is a side-effect-light predicate evaluated every tick while
//! the transition's origin state is active. Conditions capture whatever they
//! need to observe (usually shared handles into the entity).

use std::fmt;

/// Predicate that decides whether a transition fires.
///
/// # Example
///
/// ```rust
/// use tickstate::core::Condition;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let alarmed = Rc::new(Cell::new(false));
/// let flag = Rc::clone(&alarmed);
/// let heard_noise = Condition::new(move || flag.get());
///
/// assert!(!heard_noise.check());
/// alarmed.set(true);
/// assert!(heard_noise.check());
/// ```
pub struct Condition {
    predicate: Box<dyn Fn() -> bool>,
}

impl Condition {
    /// Create a condition from a predicate.
    ///
    /// The predicate must not block; the machine imposes no timeout on it.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        Condition {
            predicate: Box::new(predicate),
        }
    }

    /// A condition that always holds.
    pub fn always() -> Self {
        Self::new(|| true)
    }

    /// Evaluate the predicate.
    pub fn check(&self) -> bool {
        (self.predicate)()
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

//! Completion signal handed to the active state.
//!
//! A state reports "my work is done" through its signal instead of through a
//! polled condition. The signal does not call back into the machine: it
//! leaves a request in a sink the machine drains once the current hook
//! returns, so a state may signal from inside its own hooks.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// What a state asked the machine to do.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Request {
    /// Advance along the completion transitions.
    Complete,
    /// Jump to the state with this id, bypassing guards.
    Goto(String),
}

/// A request tagged with the activation that raised it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PendingRequest {
    pub(crate) activation: u64,
    pub(crate) request: Request,
}

/// Request slot shared between a machine and the signals it hands out.
///
/// `live` is the machine's current activation number (0 when nothing is
/// active). Requests from any other activation are refused on send, so a
/// stale handle can never displace a pending request of the live one.
#[derive(Debug, Default)]
pub(crate) struct RequestQueue {
    pending: RefCell<Option<PendingRequest>>,
    live: Cell<u64>,
}

impl RequestQueue {
    pub(crate) fn set_live(&self, activation: u64) {
        self.live.set(activation);
    }

    pub(crate) fn take(&self) -> Option<PendingRequest> {
        self.pending.borrow_mut().take()
    }

    pub(crate) fn put_back(&self, pending: PendingRequest) {
        *self.pending.borrow_mut() = Some(pending);
    }

    fn offer(&self, pending: PendingRequest) -> bool {
        if pending.activation != self.live.get() {
            return false;
        }
        *self.pending.borrow_mut() = Some(pending);
        true
    }
}

/// Shared handle to the machine's request queue.
pub(crate) type RequestSink = Rc<RequestQueue>;

/// Rebindable completion handle of one state activation.
///
/// A detached signal (the default, and what a state holds before its first
/// activation and after every exit) ignores [`complete`](Self::complete) and
/// reports [`request_state`](Self::request_state) as an error. Clones taken
/// during an earlier activation stay attached to the machine, but their
/// requests are refused as stale.
///
/// # Example
///
/// ```rust
/// use tickstate::core::CompletionSignal;
///
/// let signal = CompletionSignal::default();
/// assert!(!signal.is_attached());
/// signal.complete(); // no-op
/// ```
#[derive(Clone, Debug, Default)]
pub struct CompletionSignal {
    sink: Weak<RequestQueue>,
    activation: u64,
}

impl CompletionSignal {
    pub(crate) fn attached(sink: &RequestSink, activation: u64) -> Self {
        Self {
            sink: Rc::downgrade(sink),
            activation,
        }
    }

    pub(crate) fn detached() -> Self {
        Self::default()
    }

    /// Whether this signal still reaches a machine.
    pub fn is_attached(&self) -> bool {
        self.activation != 0 && self.sink.strong_count() > 0
    }

    /// Activation number this signal was bound for (0 when detached).
    pub fn activation(&self) -> u64 {
        self.activation
    }

    /// Report that the state finished its work.
    pub fn complete(&self) {
        if !self.send(Request::Complete) {
            tracing::debug!(
                activation = self.activation,
                "completion signalled on a detached or stale state; ignored"
            );
        }
    }

    /// Ask the machine to switch to the state with `id`.
    pub fn request_state(&self, id: impl Into<String>) {
        let id = id.into();
        if !self.send(Request::Goto(id.clone())) {
            tracing::error!(target_id = %id, "state requested a transition while inactive");
        }
    }

    fn send(&self, request: Request) -> bool {
        if self.activation == 0 {
            return false;
        }
        let Some(sink) = self.sink.upgrade() else {
            return false;
        };
        sink.offer(PendingRequest {
            activation: self.activation,
            request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_signal_is_a_no_op() {
        let signal = CompletionSignal::detached();
        assert!(!signal.is_attached());
        signal.complete();
        signal.request_state("Anywhere");
    }

    fn live_sink(activation: u64) -> RequestSink {
        let sink = RequestSink::default();
        sink.set_live(activation);
        sink
    }

    #[test]
    fn attached_signal_leaves_request_in_sink() {
        let sink = live_sink(7);
        let signal = CompletionSignal::attached(&sink, 7);

        signal.complete();

        assert_eq!(
            sink.take(),
            Some(PendingRequest {
                activation: 7,
                request: Request::Complete,
            })
        );
    }

    #[test]
    fn latest_request_replaces_earlier_one() {
        let sink = live_sink(2);
        let signal = CompletionSignal::attached(&sink, 2);

        signal.complete();
        signal.request_state("Flee");

        let pending = sink.take().unwrap();
        assert_eq!(pending.request, Request::Goto("Flee".to_string()));
    }

    #[test]
    fn stale_signal_cannot_displace_live_request() {
        let sink = live_sink(3);
        let old = CompletionSignal::attached(&sink, 1);
        let live = CompletionSignal::attached(&sink, 3);

        live.complete();
        old.complete();
        old.request_state("Flee");

        assert_eq!(
            sink.take(),
            Some(PendingRequest {
                activation: 3,
                request: Request::Complete,
            })
        );
    }

    #[test]
    fn nothing_is_accepted_while_inactive() {
        let sink = live_sink(0);
        let signal = CompletionSignal::attached(&sink, 4);

        signal.complete();

        assert_eq!(sink.take(), None);
    }

    #[test]
    fn signal_detaches_when_sink_is_dropped() {
        let sink = live_sink(1);
        let signal = CompletionSignal::attached(&sink, 1);
        assert!(signal.is_attached());

        drop(sink);

        assert!(!signal.is_attached());
        signal.complete();
    }
}

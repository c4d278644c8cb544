//! Response lifecycle state machine.
//!
//! Tracks the [`ResponseState`] of one exchange together with the one-shot
//! listeners waiting for it. The machine itself is plain data; the owning
//! [`NativeResponse`](super::NativeResponse) keeps it behind the exchange lock so
//! that a state write and the partition of its listeners form one atomic step.
//!
//! Listeners are never invoked while that lock is held. Operations that fire
//! listeners hand back a [`Notifications`] batch which the caller delivers after
//! unlocking, so a callback is free to call back into the exchange.
//!
//! # Examples
//!
//! ```
//! use fetch_relay::response::StateMachine;
//! use fetch_relay::ResponseState;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(None));
//! let mut machine = StateMachine::new();
//!
//! let sink = seen.clone();
//! machine
//!     .wait_for_states(&[ResponseState::BodyCompleted], move |s| {
//!         *sink.lock().unwrap() = Some(s);
//!     })
//!     .notify();
//! assert!(seen.lock().unwrap().is_none());
//!
//! machine.transition(ResponseState::Started).notify();
//! machine.transition(ResponseState::ResponseReceived).notify();
//! machine.transition(ResponseState::BodyCompleted).notify();
//! assert_eq!(*seen.lock().unwrap(), Some(ResponseState::BodyCompleted));
//! ```

use crate::types::ResponseState;

/// Continuation run once when an awaited state is reached.
pub type StateCallback = Box<dyn FnOnce(ResponseState) + Send>;

type StatePredicate = Box<dyn Fn(ResponseState) -> bool + Send>;

struct StateListener {
    matches: StatePredicate,
    callback: StateCallback,
}

/// Callbacks released by a state change, to be run outside the exchange lock.
#[must_use = "listeners are only invoked by calling `notify`"]
pub struct Notifications {
    state: ResponseState,
    fired: Vec<StateCallback>,
}

impl Notifications {
    fn empty(state: ResponseState) -> Self {
        Self {
            state,
            fired: Vec::new(),
        }
    }

    /// Number of callbacks in the batch.
    pub fn len(&self) -> usize {
        self.fired.len()
    }

    /// Whether the batch holds no callbacks.
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    /// Run every released callback with the state that released it.
    pub fn notify(self) {
        let state = self.state;
        for callback in self.fired {
            callback(state);
        }
    }
}

/// State of one exchange plus its pending one-shot listeners.
pub struct StateMachine {
    state: ResponseState,
    listeners: Vec<StateListener>,
}

impl StateMachine {
    /// Create a machine in [`ResponseState::Initialized`].
    pub fn new() -> Self {
        Self {
            state: ResponseState::Initialized,
            listeners: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ResponseState {
        self.state
    }

    /// Number of listeners still waiting.
    pub fn pending_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Move to `new_state` and release every listener that accepts it.
    ///
    /// Listeners that do not match stay registered for a later transition.
    /// Moving back to `Initialized`, or to `Started` once past it, is refused
    /// with a diagnostic and releases nothing.
    pub fn transition(&mut self, new_state: ResponseState) -> Notifications {
        let regresses = match new_state {
            ResponseState::Initialized => true,
            ResponseState::Started => self.state != ResponseState::Initialized,
            _ => false,
        };
        if regresses {
            tracing::warn!(
                "Refusing state regression - currentState[{}] newState[{}]",
                self.state.int_value(),
                new_state.int_value()
            );
            return Notifications::empty(self.state);
        }

        tracing::trace!(from = %self.state, to = %new_state, "response state transition");
        self.state = new_state;

        let (matched, retained): (Vec<_>, Vec<_>) = std::mem::take(&mut self.listeners)
            .into_iter()
            .partition(|listener| (listener.matches)(new_state));
        self.listeners = retained;

        Notifications {
            state: new_state,
            fired: matched.into_iter().map(|l| l.callback).collect(),
        }
    }

    /// Run `callback` once the machine is in one of `states`.
    ///
    /// If it already is, the callback is returned in the batch right away and
    /// nothing is registered. Otherwise a one-shot listener is added.
    pub fn wait_for_states<F>(&mut self, states: &[ResponseState], callback: F) -> Notifications
    where
        F: FnOnce(ResponseState) + Send + 'static,
    {
        if states.contains(&self.state) {
            return Notifications {
                state: self.state,
                fired: vec![Box::new(callback)],
            };
        }

        let states = states.to_vec();
        self.listeners.push(StateListener {
            matches: Box::new(move |s| states.contains(&s)),
            callback: Box::new(callback),
        });
        Notifications::empty(self.state)
    }

    /// Unregister every pending listener without running it.
    ///
    /// The callbacks are handed back so the caller can drop them after unlocking.
    pub fn take_listeners(&mut self) -> Vec<StateCallback> {
        std::mem::take(&mut self.listeners)
            .into_iter()
            .map(|l| l.callback)
            .collect()
    }

    /// Whether the current state is one of `valid_states`.
    ///
    /// A mismatch is logged and reported as `false`; it is never an error.
    pub fn check_state(&self, valid_states: &[ResponseState]) -> bool {
        if valid_states.contains(&self.state) {
            return true;
        }

        let valid = valid_states
            .iter()
            .map(|s| s.int_value().to_string())
            .collect::<Vec<_>>()
            .join(",");
        tracing::warn!(
            "Invalid state - currentState[{}] validStates[{}]",
            self.state.int_value(),
            valid
        );
        false
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce(ResponseState) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_starts_initialized() {
        let machine = StateMachine::new();
        assert_eq!(machine.state(), ResponseState::Initialized);
        assert_eq!(machine.pending_listeners(), 0);
    }

    #[test]
    fn test_wait_for_current_state_fires_without_registering() {
        let mut machine = StateMachine::new();
        let (count, cb) = counter();

        let batch = machine.wait_for_states(&[ResponseState::Initialized], cb);
        assert_eq!(batch.len(), 1);
        batch.notify();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(machine.pending_listeners(), 0);

        machine.transition(ResponseState::Started).notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_fires_once_on_match() {
        let mut machine = StateMachine::new();
        let (count, cb) = counter();
        machine
            .wait_for_states(
                &[ResponseState::BodyCompleted, ResponseState::ErrorReceived],
                cb,
            )
            .notify();
        assert_eq!(machine.pending_listeners(), 1);

        machine.transition(ResponseState::Started).notify();
        machine.transition(ResponseState::ResponseReceived).notify();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(machine.pending_listeners(), 1);

        machine.transition(ResponseState::ErrorReceived).notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(machine.pending_listeners(), 0);
    }

    #[test]
    fn test_callback_receives_new_state() {
        let mut machine = StateMachine::new();
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let inner = seen.clone();
        machine
            .wait_for_states(&[ResponseState::ResponseReceived], move |s| {
                *inner.lock() = Some(s);
            })
            .notify();

        machine.transition(ResponseState::Started).notify();
        machine.transition(ResponseState::ResponseReceived).notify();
        assert_eq!(*seen.lock(), Some(ResponseState::ResponseReceived));
    }

    #[test]
    fn test_unmatched_listeners_are_retained() {
        let mut machine = StateMachine::new();
        let (first, cb1) = counter();
        let (second, cb2) = counter();
        machine.wait_for_states(&[ResponseState::Started], cb1).notify();
        machine
            .wait_for_states(&[ResponseState::BodyCompleted], cb2)
            .notify();

        let batch = machine.transition(ResponseState::Started);
        assert_eq!(batch.len(), 1);
        batch.notify();

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert_eq!(machine.pending_listeners(), 1);
    }

    #[test]
    fn test_notifications_deferred_until_notify() {
        let mut machine = StateMachine::new();
        let (count, cb) = counter();
        machine.wait_for_states(&[ResponseState::Started], cb).notify();

        let batch = machine.transition(ResponseState::Started);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        batch.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refuses_regression() {
        let mut machine = StateMachine::new();
        machine.transition(ResponseState::Started).notify();
        machine.transition(ResponseState::ResponseReceived).notify();

        assert!(machine.transition(ResponseState::Started).is_empty());
        assert_eq!(machine.state(), ResponseState::ResponseReceived);

        machine.transition(ResponseState::Initialized).notify();
        assert_eq!(machine.state(), ResponseState::ResponseReceived);
    }

    #[test]
    fn test_take_listeners_drops_without_running() {
        let mut machine = StateMachine::new();
        let (count, cb) = counter();
        machine
            .wait_for_states(&[ResponseState::BodyCompleted], cb)
            .notify();

        let taken = machine.take_listeners();
        assert_eq!(taken.len(), 1);
        assert_eq!(machine.pending_listeners(), 0);
        drop(taken);

        machine.transition(ResponseState::Started).notify();
        machine.transition(ResponseState::ResponseReceived).notify();
        machine.transition(ResponseState::BodyCompleted).notify();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_check_state() {
        let mut machine = StateMachine::new();
        assert!(machine.check_state(&[ResponseState::Initialized]));
        assert!(!machine.check_state(&[ResponseState::Started]));

        machine.transition(ResponseState::Started).notify();
        assert!(machine.check_state(&[
            ResponseState::Started,
            ResponseState::ResponseReceived
        ]));
    }
}

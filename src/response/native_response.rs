//! The exchange: one response lifecycle with its buffer, metadata and events.

use super::sink::ResponseSink;
use super::state::{Notifications, StateMachine};
use crate::bridge::EventEmitter;
use crate::error::FetchError;
use crate::types::{FetchEvent, ResponseInit, ResponseState};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

use ResponseState::*;

/// States in which a transport failure is still meaningful.
const FAILURE_STATES: [ResponseState; 4] = [
    Started,
    ResponseReceived,
    BodyStreamingStarted,
    BodyStreamingCancelled,
];

/// States in which the body pump keeps reading.
pub(crate) const PUMP_STATES: [ResponseState; 3] =
    [ResponseReceived, BodyStreamingStarted, BodyStreamingCancelled];

const START_STREAMING_STATES: [ResponseState; 2] = [ResponseReceived, BodyCompleted];

/// What the pump should do after handing over a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PumpControl {
    /// Keep reading
    Continue,
    /// Stop reading and drop the remaining body
    Stop,
}

struct Shared {
    machine: StateMachine,
    sink: ResponseSink,
    init: Option<ResponseInit>,
    error: Option<FetchError>,
}

/// One HTTP response as seen by script code.
///
/// Body bytes that arrive before [`start_streaming`](Self::start_streaming) are
/// buffered. Starting the stream flushes the buffer as a single
/// `didReceiveResponseData` event and switches to live forwarding, so a caller can
/// attach at any point without losing or reordering bytes.
///
/// State, listeners, buffer, metadata and error live behind one lock. Events are
/// emitted while it is held, which keeps the flushed buffer ahead of every live
/// chunk. State listeners run after it is released.
///
/// Calling an operation from a state that does not allow it is logged and ignored.
pub struct NativeResponse {
    shared: Mutex<Shared>,
    emitter: Arc<dyn EventEmitter>,
}

impl NativeResponse {
    /// Create an exchange that reports through `emitter`.
    pub fn new(emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            shared: Mutex::new(Shared {
                machine: StateMachine::new(),
                sink: ResponseSink::new(),
                init: None,
                error: None,
            }),
            emitter,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ResponseState {
        self.shared.lock().machine.state()
    }

    /// Whether body bytes were buffered or handed out.
    pub fn body_used(&self) -> bool {
        self.shared.lock().sink.body_used()
    }

    /// Response metadata, once the head has arrived.
    pub fn response_init(&self) -> Option<ResponseInit> {
        self.shared.lock().init.clone()
    }

    /// The recorded failure, if any.
    pub fn error(&self) -> Option<FetchError> {
        self.shared.lock().error.clone()
    }

    /// Whether the current state is one of `valid_states`, logging when not.
    pub fn check_state(&self, valid_states: &[ResponseState]) -> bool {
        self.shared.lock().machine.check_state(valid_states)
    }

    /// Start delivering the body as events.
    ///
    /// Flushes everything buffered so far as one data event. From
    /// `ResponseReceived` the exchange then forwards chunks live; from
    /// `BodyCompleted` the whole body is already out, so `didComplete` follows
    /// immediately and the state is left alone.
    pub fn start_streaming(&self) {
        let batch = {
            let mut shared = self.shared.lock();
            if !shared.machine.check_state(&START_STREAMING_STATES) {
                return;
            }

            let queued = shared.sink.finalize();
            self.emitter.emit(FetchEvent::DidReceiveResponseData(queued));

            match shared.machine.state() {
                ResponseReceived => shared.machine.transition(BodyStreamingStarted),
                _ => {
                    self.emitter.emit(FetchEvent::DidComplete);
                    return;
                }
            }
        };
        batch.notify();
    }

    /// Stop emitting body events. The pump keeps draining the connection.
    pub fn cancel_streaming(&self) {
        let batch = {
            let mut shared = self.shared.lock();
            if !shared.machine.check_state(&[BodyStreamingStarted]) {
                return;
            }
            shared.machine.transition(BodyStreamingCancelled)
        };
        batch.notify();
    }

    /// Record a cancellation error and force the exchange into `ErrorReceived`.
    ///
    /// Applies from any state and wakes every listener waiting on `ErrorReceived`.
    pub fn emit_request_cancelled(&self) {
        let batch = {
            let mut shared = self.shared.lock();
            shared.error = Some(FetchError::RequestCancelled);
            shared.machine.transition(ErrorReceived)
        };
        batch.notify();
    }

    /// Run `callback` once the exchange is in one of `states`.
    ///
    /// Runs synchronously, before returning, when it already is.
    pub fn wait_for_states<F>(&self, states: &[ResponseState], callback: F)
    where
        F: FnOnce(ResponseState) + Send + 'static,
    {
        let batch = self.shared.lock().machine.wait_for_states(states, callback);
        batch.notify();
    }

    /// Resolve with the first of `states` the exchange reaches.
    ///
    /// If the exchange is closed first, resolves with whatever state it is in.
    pub async fn wait_for_states_async(&self, states: &[ResponseState]) -> ResponseState {
        let (tx, rx) = oneshot::channel();
        self.wait_for_states(states, move |state| {
            let _ = tx.send(state);
        });
        match rx.await {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Drop every pending listener without running it.
    ///
    /// Used on release: no further transition will come, so async waiters resolve
    /// with the current state instead of hanging.
    pub fn close(&self) {
        let dropped = self.shared.lock().machine.take_listeners();
        if !dropped.is_empty() {
            tracing::trace!(count = dropped.len(), "dropping pending state listeners");
        }
    }

    /// Move from `Initialized` to `Started`. Returns `false` if already sent.
    pub(crate) fn mark_started(&self) -> bool {
        let batch = {
            let mut shared = self.shared.lock();
            if !shared.machine.check_state(&[Initialized]) {
                return false;
            }
            shared.machine.transition(Started)
        };
        batch.notify();
        true
    }

    /// Transport failure reported by the HTTP client or the body source.
    ///
    /// Dropped unless the exchange is still in flight. A consumer that is
    /// streaming gets `didFailWithError`; anyone else finds the error through
    /// [`error`](Self::error).
    pub fn on_failure(&self, error: FetchError) {
        let batch = {
            let mut shared = self.shared.lock();
            if !shared.machine.check_state(&FAILURE_STATES) {
                return;
            }
            if shared.machine.state() == BodyStreamingStarted {
                self.emitter
                    .emit(FetchEvent::DidFailWithError(error.to_string()));
            }
            tracing::debug!(%error, "response failed");
            shared.error = Some(error);
            shared.machine.transition(ErrorReceived)
        };
        batch.notify();
    }

    /// Response head received. Returns whether the body should be pumped.
    pub fn on_response(&self, init: ResponseInit) -> bool {
        let batch = {
            let mut shared = self.shared.lock();
            if !shared.machine.check_state(&[Started]) {
                return false;
            }
            tracing::debug!(status = init.status, url = %init.url, "response received");
            shared.init = Some(init);
            shared.machine.transition(ResponseReceived)
        };
        batch.notify();
        true
    }

    /// Route one drained chunk according to the current state.
    pub(crate) fn on_body_chunk(&self, chunk: Bytes) -> PumpControl {
        let mut shared = self.shared.lock();
        if !shared.machine.check_state(&PUMP_STATES) {
            return PumpControl::Stop;
        }
        match shared.machine.state() {
            ResponseReceived => shared.sink.append(chunk),
            BodyStreamingStarted => self
                .emitter
                .emit(FetchEvent::DidReceiveResponseData(chunk)),
            _ => tracing::trace!(len = chunk.len(), "streaming cancelled, discarding chunk"),
        }
        PumpControl::Continue
    }

    /// The body source is exhausted and closed.
    ///
    /// An error that won the race keeps the exchange in `ErrorReceived`.
    pub(crate) fn on_body_exhausted(&self) {
        let batch: Notifications = {
            let mut shared = self.shared.lock();
            let state = shared.machine.state();
            if state == BodyStreamingStarted {
                self.emitter.emit(FetchEvent::DidComplete);
            }
            if !PUMP_STATES.contains(&state) {
                tracing::debug!(%state, "body finished after exchange left streaming states");
                return;
            }
            shared.machine.transition(BodyCompleted)
        };
        batch.notify();
    }
}

impl std::fmt::Debug for NativeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("NativeResponse")
            .field("state", &shared.machine.state())
            .field("buffered", &shared.sink.buffered_len())
            .field("error", &shared.error)
            .finish()
    }
}

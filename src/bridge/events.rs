//! Event delivery from exchanges to script code.
//!
//! Exchanges push [`FetchEvent`]s through the [`EventEmitter`] seam. Emission is
//! fire-and-forget: there is no acknowledgement and no backpressure, and an event
//! sent while nobody listens is lost.
//!
//! The bridge side uses [`ExchangeEmitter`], which tags every event with the id of
//! the exchange that produced it and forwards it over an unbounded channel. Script
//! glue drains the other end through an [`EventStream`].
//!
//! # Examples
//!
//! ```ignore
//! use fetch_relay::bridge::NetworkFetchModule;
//! use futures::StreamExt;
//!
//! let (module, mut events) = NetworkFetchModule::new(Default::default())?;
//! while let Some(event) = events.next().await {
//!     println!("{} -> {}", event.id, event.event.name());
//! }
//! ```

use super::ExchangeId;
use crate::types::FetchEvent;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Sink for events produced by an exchange.
///
/// Implementations must not block; they are called with the exchange lock held.
pub trait EventEmitter: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: FetchEvent);
}

impl EventEmitter for mpsc::UnboundedSender<FetchEvent> {
    fn emit(&self, event: FetchEvent) {
        let _ = self.send(event);
    }
}

/// An event tagged with the exchange that emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeEvent {
    /// Emitting exchange
    pub id: ExchangeId,
    /// The event itself
    pub event: FetchEvent,
}

/// Emitter bound to one exchange id.
#[derive(Debug, Clone)]
pub struct ExchangeEmitter {
    id: ExchangeId,
    sender: mpsc::UnboundedSender<ExchangeEvent>,
}

impl ExchangeEmitter {
    /// Create an emitter that tags events with `id`.
    pub fn new(id: ExchangeId, sender: mpsc::UnboundedSender<ExchangeEvent>) -> Self {
        Self { id, sender }
    }
}

impl EventEmitter for ExchangeEmitter {
    fn emit(&self, event: FetchEvent) {
        let name = event.name();
        if self.sender.send(ExchangeEvent { id: self.id, event }).is_err() {
            tracing::trace!(id = %self.id, event = name, "no event listener attached, dropping");
        }
    }
}

/// Receiving end of the module's event channel.
///
/// Usable either through [`next`](Self::next) or as a [`Stream`].
pub struct EventStream {
    receiver: UnboundedReceiverStream<ExchangeEvent>,
}

impl EventStream {
    /// Wrap a receiver channel.
    pub fn new(receiver: mpsc::UnboundedReceiver<ExchangeEvent>) -> Self {
        EventStream {
            receiver: UnboundedReceiverStream::new(receiver),
        }
    }

    /// Receive the next event, or `None` once every emitter is gone.
    pub async fn next(&mut self) -> Option<ExchangeEvent> {
        futures::StreamExt::next(&mut self.receiver).await
    }
}

impl Stream for EventStream {
    type Item = ExchangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

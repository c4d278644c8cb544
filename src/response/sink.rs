//! Buffer for body chunks that arrive before a consumer starts streaming.

use bytes::{Bytes, BytesMut};

/// Append-only queue of body chunks with a one-shot concatenation.
///
/// The sink does no locking of its own. It lives inside the exchange's shared
/// state and is only touched while that lock is held.
#[derive(Debug, Default)]
pub struct ResponseSink {
    queue: Vec<Bytes>,
    used: bool,
    finalized: bool,
}

impl ResponseSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a chunk at the tail.
    pub fn append(&mut self, chunk: Bytes) {
        self.used = true;
        self.queue.push(chunk);
    }

    /// Concatenate everything queued so far, in arrival order, and empty the queue.
    ///
    /// Finalizing an already drained sink yields an empty buffer.
    pub fn finalize(&mut self) -> Bytes {
        self.used = true;
        self.finalized = true;

        match self.queue.len() {
            0 => Bytes::new(),
            1 => self.queue.pop().unwrap_or_default(),
            _ => {
                let size = self.queue.iter().map(Bytes::len).sum();
                let mut buf = BytesMut::with_capacity(size);
                for chunk in self.queue.drain(..) {
                    buf.extend_from_slice(&chunk);
                }
                buf.freeze()
            }
        }
    }

    /// Whether any byte was queued or the body was handed out.
    pub fn body_used(&self) -> bool {
        self.used
    }

    /// Whether [`finalize`](Self::finalize) has run.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of bytes waiting in the queue.
    pub fn buffered_len(&self) -> usize {
        self.queue.iter().map(Bytes::len).sum()
    }
}

//! Registry of live exchanges, keyed by opaque id.
//!
//! Script code holds exchanges across an asynchronous boundary, so their lifetime
//! is explicit: an exchange lives in the registry from construction until it is
//! released, and releasing an in-flight exchange cancels it. Reference counts alone
//! would not cancel a request promptly when script code lets go of it.

use crate::client::NativeRequest;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque handle to one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying uuid.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ExchangeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Thread-safe arena of exchanges.
///
/// Cloning yields another handle to the same registry.
///
/// # Examples
///
/// ```ignore
/// use fetch_relay::bridge::{ExchangeId, ExchangeRegistry};
///
/// let registry = ExchangeRegistry::new();
/// let id = ExchangeId::new();
/// registry.insert(id, request);
/// assert!(registry.get(&id).is_some());
/// assert!(registry.release(&id));
/// ```
#[derive(Clone, Default)]
pub struct ExchangeRegistry {
    exchanges: Arc<RwLock<HashMap<ExchangeId, Arc<NativeRequest>>>>,
}

impl ExchangeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `request` under `id`, replacing and cancelling any previous holder.
    pub fn insert(&self, id: ExchangeId, request: NativeRequest) -> Arc<NativeRequest> {
        let request = Arc::new(request);
        let previous = self.exchanges.write().insert(id, request.clone());
        if let Some(previous) = previous {
            tracing::warn!(%id, "exchange id reused, cancelling previous holder");
            previous.cancel();
        }
        request
    }

    /// Look up an exchange.
    pub fn get(&self, id: &ExchangeId) -> Option<Arc<NativeRequest>> {
        self.exchanges.read().get(id).cloned()
    }

    /// Remove an exchange, cancelling it if still in flight.
    ///
    /// Returns `false` if nothing was registered under `id`.
    pub fn release(&self, id: &ExchangeId) -> bool {
        let removed = self.exchanges.write().remove(id);
        match removed {
            Some(request) => {
                tracing::debug!(%id, in_flight = request.is_in_flight(), "releasing exchange");
                request.cancel();
                true
            }
            None => false,
        }
    }

    /// Release every exchange.
    pub fn release_all(&self) {
        let drained: Vec<_> = self.exchanges.write().drain().collect();
        for (_, request) in drained {
            request.cancel();
        }
    }

    /// Ids of all registered exchanges, in arbitrary order.
    pub fn list(&self) -> Vec<ExchangeId> {
        self.exchanges.read().keys().copied().collect()
    }

    /// Number of registered exchanges.
    pub fn len(&self) -> usize {
        self.exchanges.read().len()
    }

    /// Whether no exchange is registered.
    pub fn is_empty(&self) -> bool {
        self.exchanges.read().is_empty()
    }
}

//! The facade a script bridge calls into.
//!
//! [`NetworkFetchModule`] owns the HTTP client, the exchange registry and the
//! event channel. Script glue maps each of its methods onto a function of the
//! script-side `NativeRequest`/`NativeResponse` objects and forwards the
//! [`EventStream`] to the script event emitter.
//!
//! # Examples
//!
//! ```ignore
//! use fetch_relay::bridge::NetworkFetchModule;
//! use fetch_relay::ResponseState;
//!
//! let (module, mut events) = NetworkFetchModule::new(Default::default())?;
//! let id = module.construct();
//! module.send_request(&id, "https://example.com/".parse()?)?;
//! module.wait_for_states(&id, &[ResponseState::ResponseReceived]).await?;
//! module.start_streaming(&id)?;
//! while let Some(event) = events.next().await {
//!     println!("{}", event.event.name());
//! }
//! module.release(&id);
//! ```

use super::events::{EventStream, ExchangeEmitter, ExchangeEvent};
use super::registry::{ExchangeId, ExchangeRegistry};
use crate::client::{ClientConfig, HttpClient, NativeRequest, ReqwestClient};
use crate::error::{FetchError, Result};
use crate::response::NativeResponse;
use crate::types::{RequestInit, ResponseInit, ResponseState, EVENT_NAMES};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use url::Url;

/// Module name under which the bridge registers this module.
///
/// Deliberately unprefixed: hosts that expect a vendor-prefixed name such as
/// `ExpoNetworkFetchModule` alias it in their registration glue.
pub const MODULE_NAME: &str = "NetworkFetchModule";

/// Entry point for script bridges.
#[derive(Clone)]
pub struct NetworkFetchModule {
    client: Arc<dyn HttpClient>,
    registry: ExchangeRegistry,
    events: mpsc::UnboundedSender<ExchangeEvent>,
    runtime: Handle,
}

impl NetworkFetchModule {
    /// Create a module backed by [`ReqwestClient`] on the current tokio runtime.
    pub fn new(config: ClientConfig) -> Result<(Self, EventStream)> {
        let runtime = Handle::try_current().map_err(|e| FetchError::Runtime(e.to_string()))?;
        Ok(Self::with_client(
            Arc::new(ReqwestClient::with_config(config)),
            runtime,
        ))
    }

    /// Create a module around any [`HttpClient`], spawning exchanges on `runtime`.
    pub fn with_client(client: Arc<dyn HttpClient>, runtime: Handle) -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let module = Self {
            client,
            registry: ExchangeRegistry::new(),
            events: tx,
            runtime,
        };
        (module, EventStream::new(rx))
    }

    /// Names of the events this module emits.
    pub fn events(&self) -> &'static [&'static str] {
        &EVENT_NAMES
    }

    /// The exchange registry.
    pub fn registry(&self) -> &ExchangeRegistry {
        &self.registry
    }

    /// Construct a new exchange and return its handle.
    pub fn construct(&self) -> ExchangeId {
        let id = ExchangeId::new();
        let emitter = Arc::new(ExchangeEmitter::new(id, self.events.clone()));
        let request = NativeRequest::new(self.client.clone(), emitter, self.runtime.clone());
        self.registry.insert(id, request);
        tracing::trace!(%id, "exchange constructed");
        id
    }

    /// Release an exchange, cancelling it if still in flight.
    pub fn release(&self, id: &ExchangeId) -> bool {
        self.registry.release(id)
    }

    /// Issue a `GET` for `url`.
    pub fn send_request(&self, id: &ExchangeId, url: Url) -> Result<()> {
        self.request(id)?.send_request(url);
        Ok(())
    }

    /// Issue a request shaped by `init`.
    pub fn send_request_with(&self, id: &ExchangeId, url: &str, init: RequestInit) -> Result<()> {
        let url = Url::parse(url)?;
        self.request(id)?.send_request_with(url, init);
        Ok(())
    }

    /// Start delivering the body as events.
    pub fn start_streaming(&self, id: &ExchangeId) -> Result<()> {
        self.response(id)?.start_streaming();
        Ok(())
    }

    /// Stop delivering body events.
    pub fn cancel_streaming(&self, id: &ExchangeId) -> Result<()> {
        self.response(id)?.cancel_streaming();
        Ok(())
    }

    /// Resolve with the first of `states` the exchange reaches.
    pub async fn wait_for_states(
        &self,
        id: &ExchangeId,
        states: &[ResponseState],
    ) -> Result<ResponseState> {
        let response = self.response(id)?;
        Ok(response.wait_for_states_async(states).await)
    }

    /// Current state of an exchange.
    pub fn state(&self, id: &ExchangeId) -> Result<ResponseState> {
        Ok(self.response(id)?.state())
    }

    /// Whether the exchange's body was buffered or handed out.
    pub fn body_used(&self, id: &ExchangeId) -> Result<bool> {
        Ok(self.response(id)?.body_used())
    }

    /// Response metadata, once received.
    pub fn response_init(&self, id: &ExchangeId) -> Result<Option<ResponseInit>> {
        Ok(self.response(id)?.response_init())
    }

    /// The recorded failure, if any.
    pub fn error(&self, id: &ExchangeId) -> Result<Option<FetchError>> {
        Ok(self.response(id)?.error())
    }

    fn request(&self, id: &ExchangeId) -> Result<Arc<NativeRequest>> {
        self.registry
            .get(id)
            .ok_or(FetchError::ExchangeNotFound(*id))
    }

    fn response(&self, id: &ExchangeId) -> Result<Arc<NativeResponse>> {
        Ok(self.request(id)?.response().clone())
    }
}

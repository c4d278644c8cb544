//! Request driver: issues one request and feeds its outcome into an exchange.

use super::transport::{FetchRequest, HttpClient, HttpResponse};
use crate::bridge::EventEmitter;
use crate::response::pump::pump_response_body;
use crate::response::NativeResponse;
use crate::types::{RequestInit, ResponseState};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use url::Url;

/// One outbound request and the [`NativeResponse`] it fills.
///
/// The request and the body drain run together on a single task spawned on the
/// given runtime; nothing here blocks the caller. The outcome is only observable
/// through the response's state, events and error.
pub struct NativeRequest {
    client: Arc<dyn HttpClient>,
    response: Arc<NativeResponse>,
    runtime: Handle,
    task: Mutex<Option<AbortHandle>>,
}

impl NativeRequest {
    /// Create a request that will run on `runtime` and report through `emitter`.
    pub fn new(client: Arc<dyn HttpClient>, emitter: Arc<dyn EventEmitter>, runtime: Handle) -> Self {
        Self {
            client,
            response: Arc::new(NativeResponse::new(emitter)),
            runtime,
            task: Mutex::new(None),
        }
    }

    /// The response this request fills.
    pub fn response(&self) -> &Arc<NativeResponse> {
        &self.response
    }

    /// Issue a `GET` for `url`.
    pub fn send_request(&self, url: Url) {
        self.send_request_with(url, RequestInit::default())
    }

    /// Issue a request for `url` shaped by `init`.
    ///
    /// Only the first call does anything; later calls are logged and ignored.
    pub fn send_request_with(&self, url: Url, init: RequestInit) {
        if !self.response.mark_started() {
            return;
        }

        tracing::debug!(method = %init.method, %url, "sending request");
        let request = FetchRequest::new(url, init);
        let client = self.client.clone();
        let response = self.response.clone();

        let handle = self.runtime.spawn(async move {
            match client.execute(request).await {
                Ok(HttpResponse { init, body }) => {
                    if response.on_response(init) {
                        pump_response_body(&response, body).await;
                    }
                }
                Err(e) => response.on_failure(e),
            }
        });
        *self.task.lock() = Some(handle.abort_handle());
    }

    /// Whether the request was sent and has not reached a terminal state.
    pub fn is_in_flight(&self) -> bool {
        let state = self.response.state();
        state != ResponseState::Initialized && !state.is_terminal()
    }

    /// Tear the request down.
    ///
    /// An in-flight exchange is forced into `ErrorReceived` with a cancellation
    /// error before its task is aborted, which also closes the connection.
    /// Listeners still waiting afterwards are dropped.
    pub fn cancel(&self) {
        if self.is_in_flight() {
            self.response.emit_request_cancelled();
        }
        self.response.close();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for NativeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeRequest")
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryBody;
    use crate::error::{FetchError, Result};
    use crate::types::{FetchEvent, ResponseInit};
    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::mpsc;

    struct StubClient {
        outcome: std::result::Result<Vec<&'static [u8]>, FetchError>,
    }

    #[async_trait]
    impl HttpClient for StubClient {
        async fn execute(&self, request: FetchRequest) -> Result<HttpResponse> {
            let chunks = self.outcome.clone()?;
            Ok(HttpResponse {
                init: ResponseInit {
                    status: 200,
                    status_text: "OK".into(),
                    headers: vec![],
                    url: request.url.to_string(),
                    redirected: false,
                },
                body: Box::new(MemoryBody::new(chunks.into_iter().map(Bytes::from_static))),
            })
        }
    }

    struct PendingClient;

    #[async_trait]
    impl HttpClient for PendingClient {
        async fn execute(&self, _request: FetchRequest) -> Result<HttpResponse> {
            futures::future::pending().await
        }
    }

    fn request(client: impl HttpClient + 'static) -> (NativeRequest, mpsc::UnboundedReceiver<FetchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let request = NativeRequest::new(Arc::new(client), Arc::new(tx), Handle::current());
        (request, rx)
    }

    fn url() -> Url {
        Url::parse("https://example.com/data").unwrap()
    }

    #[tokio::test]
    async fn test_send_request_completes_body() {
        let (request, _rx) = request(StubClient {
            outcome: Ok(vec![b"one", b"two"]),
        });
        request.send_request(url());
        assert_eq!(request.response().state(), ResponseState::Started);

        let state = request
            .response()
            .wait_for_states_async(&[ResponseState::BodyCompleted, ResponseState::ErrorReceived])
            .await;
        assert_eq!(state, ResponseState::BodyCompleted);
        assert_eq!(
            request.response().response_init().unwrap().url,
            "https://example.com/data"
        );
        assert!(request.response().body_used());
        assert!(!request.is_in_flight());
    }

    #[tokio::test]
    async fn test_send_request_failure() {
        let (request, mut rx) = request(StubClient {
            outcome: Err(FetchError::Transport("dns failure".into())),
        });
        request.send_request(url());

        let state = request
            .response()
            .wait_for_states_async(&[ResponseState::ErrorReceived])
            .await;
        assert_eq!(state, ResponseState::ErrorReceived);
        assert_eq!(
            request.response().error(),
            Some(FetchError::Transport("dns failure".into()))
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_in_flight() {
        let (request, _rx) = request(PendingClient);
        request.send_request(url());
        assert!(request.is_in_flight());

        request.cancel();
        assert_eq!(request.response().state(), ResponseState::ErrorReceived);
        assert_eq!(request.response().error(), Some(FetchError::RequestCancelled));
    }

    #[tokio::test]
    async fn test_cancel_before_send_keeps_state() {
        let (request, _rx) = request(PendingClient);
        request.cancel();
        assert_eq!(request.response().state(), ResponseState::Initialized);
        assert!(request.response().error().is_none());
    }

    #[tokio::test]
    async fn test_cancel_before_send_resolves_waiters() {
        let (request, _rx) = request(PendingClient);
        let response = request.response().clone();
        let waiter = tokio::spawn(async move {
            response
                .wait_for_states_async(&[ResponseState::BodyCompleted, ResponseState::ErrorReceived])
                .await
        });
        tokio::task::yield_now().await;

        request.cancel();
        let state = tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter still pending after cancel")
            .unwrap();
        assert_eq!(state, ResponseState::Initialized);
    }
}

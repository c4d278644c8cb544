//! Background drain of a response body into its exchange.

use super::native_response::{NativeResponse, PumpControl, PUMP_STATES};
use crate::client::ByteSource;

/// Read `body` until it is exhausted, handing each chunk to `response`.
///
/// Runs on the exchange's own task. Reading stops early, dropping the rest of
/// the body, once the exchange leaves the streaming states. A read error is
/// reported as a transport failure.
pub(crate) async fn pump_response_body(response: &NativeResponse, mut body: Box<dyn ByteSource>) {
    let mut chunks = 0usize;
    while response.check_state(&PUMP_STATES) {
        match body.read_chunk().await {
            Ok(Some(chunk)) => {
                if chunk.is_empty() {
                    continue;
                }
                chunks += 1;
                if response.on_body_chunk(chunk) == PumpControl::Stop {
                    break;
                }
            }
            Ok(None) => {
                drop(body);
                tracing::debug!(chunks, "response body drained");
                response.on_body_exhausted();
                return;
            }
            Err(err) => {
                drop(body);
                response.on_failure(err);
                return;
            }
        }
    }
    tracing::debug!(chunks, state = %response.state(), "body drain stopped, discarding remainder");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryBody;
    use crate::error::FetchError;
    use crate::types::{FetchEvent, ResponseInit, ResponseState};
    use bytes::Bytes;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn started(tx: mpsc::UnboundedSender<FetchEvent>) -> NativeResponse {
        let response = NativeResponse::new(Arc::new(tx));
        assert!(response.mark_started());
        assert!(response.on_response(ResponseInit {
            status: 200,
            status_text: "OK".into(),
            headers: vec![],
            url: "https://example.com/".into(),
            redirected: false,
        }));
        response
    }

    #[tokio::test]
    async fn test_pump_buffers_until_exhausted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let response = started(tx);
        let body = MemoryBody::new(vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cd")]);

        pump_response_body(&response, Box::new(body)).await;

        assert_eq!(response.state(), ResponseState::BodyCompleted);
        assert!(rx.try_recv().is_err());
        response.start_streaming();
        assert_eq!(
            rx.try_recv().unwrap(),
            FetchEvent::DidReceiveResponseData(Bytes::from_static(b"abcd"))
        );
        assert_eq!(rx.try_recv().unwrap(), FetchEvent::DidComplete);
    }

    #[tokio::test]
    async fn test_pump_read_error_while_buffering_is_recorded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let response = started(tx);

        let (body_tx, body_rx) = mpsc::unbounded_channel();
        body_tx.send(Ok(Bytes::from_static(b"head"))).unwrap();
        body_tx
            .send(Err(FetchError::Transport("connection reset".into())))
            .unwrap();

        pump_response_body(&response, Box::new(body_rx)).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(response.state(), ResponseState::ErrorReceived);
        assert_eq!(
            response.error(),
            Some(FetchError::Transport("connection reset".into()))
        );

        response.start_streaming();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pump_read_error_becomes_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let response = started(tx);
        response.start_streaming();
        let _ = rx.try_recv();

        let (body_tx, body_rx) = mpsc::unbounded_channel();
        body_tx.send(Ok(Bytes::from_static(b"partial"))).unwrap();
        body_tx
            .send(Err(FetchError::Transport("connection reset".into())))
            .unwrap();

        pump_response_body(&response, Box::new(body_rx)).await;

        assert_eq!(
            rx.try_recv().unwrap(),
            FetchEvent::DidReceiveResponseData(Bytes::from_static(b"partial"))
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            FetchEvent::DidFailWithError(_)
        ));
        assert_eq!(response.state(), ResponseState::ErrorReceived);
    }

    #[tokio::test]
    async fn test_pump_stops_after_hard_cancel() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let response = started(tx);
        response.emit_request_cancelled();

        let body = MemoryBody::new(vec![Bytes::from_static(b"never")]);
        pump_response_body(&response, Box::new(body)).await;

        assert_eq!(response.state(), ResponseState::ErrorReceived);
        assert!(!response.body_used());
    }
}

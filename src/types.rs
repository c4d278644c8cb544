//! Core data types shared by the exchange, the HTTP client seam and the bridge.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ResponseState`] | Lifecycle state of one exchange |
//! | [`ResponseInit`] | Response metadata captured when headers arrive |
//! | [`FetchEvent`] | Event pushed to script code |
//! | [`RequestInit`] | Method, headers and body for an outbound request |

use bytes::Bytes;
use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event name for a chunk of response body.
pub const DID_RECEIVE_RESPONSE_DATA: &str = "didReceiveResponseData";
/// Event name for the end of a streamed body.
pub const DID_COMPLETE: &str = "didComplete";
/// Event name for a failure seen while streaming.
pub const DID_FAIL_WITH_ERROR: &str = "didFailWithError";

/// Every event name an exchange may emit.
pub const EVENT_NAMES: [&str; 3] = [DID_RECEIVE_RESPONSE_DATA, DID_COMPLETE, DID_FAIL_WITH_ERROR];

/// Lifecycle state of a fetch exchange.
///
/// ```text
/// Initialized → Started → ResponseReceived → BodyStreamingStarted → BodyStreamingCancelled
///                                          ↘ BodyCompleted
/// (any non-terminal state) → ErrorReceived
/// ```
///
/// The discriminants are stable and exposed through [`ResponseState::int_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseState {
    /// Constructed, no request issued yet
    Initialized = 0,
    /// Request handed to the HTTP client
    Started = 1,
    /// Headers received, body being buffered
    ResponseReceived = 2,
    /// Body fully drained
    BodyCompleted = 3,
    /// Consumer attached, body chunks are emitted live
    BodyStreamingStarted = 4,
    /// Consumer detached, remaining body is discarded
    BodyStreamingCancelled = 5,
    /// Transport failure or cancellation recorded
    ErrorReceived = 6,
}

impl ResponseState {
    /// Stable integer value of the state.
    pub fn int_value(self) -> u8 {
        self as u8
    }

    /// Whether the body pump can make no further progress from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, ResponseState::BodyCompleted | ResponseState::ErrorReceived)
    }
}

impl fmt::Display for ResponseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.int_value())
    }
}

/// Response metadata, captured once when the response head arrives.
///
/// Serializes to the shape script code expects for a `Response` init dictionary:
///
/// ```
/// use fetch_relay::ResponseInit;
///
/// let init = ResponseInit {
///     status: 200,
///     status_text: "OK".into(),
///     headers: vec![("content-type".into(), "text/plain".into())],
///     url: "https://example.com/".into(),
///     redirected: false,
/// };
/// let json = serde_json::to_value(&init).unwrap();
/// assert_eq!(json["statusText"], "OK");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInit {
    /// Numeric HTTP status code
    pub status: u16,
    /// Reason phrase, empty when the code has none
    pub status_text: String,
    /// Header pairs in received order, duplicates preserved
    pub headers: Vec<(String, String)>,
    /// Final URL after redirects
    pub url: String,
    /// Whether the final URL differs from the requested one
    pub redirected: bool,
}

impl ResponseInit {
    /// All values for a header name, compared case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An event pushed from an exchange to script code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// A chunk of response body bytes
    DidReceiveResponseData(Bytes),
    /// The streamed body has ended
    DidComplete,
    /// The request failed while a consumer was streaming
    DidFailWithError(String),
}

impl FetchEvent {
    /// The bridge-facing event name.
    pub fn name(&self) -> &'static str {
        match self {
            FetchEvent::DidReceiveResponseData(_) => DID_RECEIVE_RESPONSE_DATA,
            FetchEvent::DidComplete => DID_COMPLETE,
            FetchEvent::DidFailWithError(_) => DID_FAIL_WITH_ERROR,
        }
    }
}

/// Options for an outbound request. Defaults to a bodiless `GET`.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    /// HTTP method
    pub method: Method,
    /// Extra request headers, sent in order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Option<Bytes>,
}

impl RequestInit {
    /// Create a bodiless `GET`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Append a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_values_are_stable() {
        assert_eq!(ResponseState::Initialized.int_value(), 0);
        assert_eq!(ResponseState::BodyCompleted.int_value(), 3);
        assert_eq!(ResponseState::ErrorReceived.int_value(), 6);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ResponseState::BodyCompleted.is_terminal());
        assert!(ResponseState::ErrorReceived.is_terminal());
        assert!(!ResponseState::BodyStreamingCancelled.is_terminal());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(FetchEvent::DidComplete.name(), "didComplete");
        assert_eq!(
            FetchEvent::DidReceiveResponseData(Bytes::new()).name(),
            "didReceiveResponseData"
        );
        assert_eq!(EVENT_NAMES.len(), 3);
    }

    #[test]
    fn test_response_init_serialization() {
        let init = ResponseInit {
            status: 404,
            status_text: "Not Found".into(),
            headers: vec![
                ("set-cookie".into(), "a=1".into()),
                ("set-cookie".into(), "b=2".into()),
            ],
            url: "https://example.com/missing".into(),
            redirected: true,
        };
        let json = serde_json::to_value(&init).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["redirected"], true);
        assert_eq!(json["headers"][1][1], "b=2");
        assert_eq!(init.header_values("Set-Cookie").count(), 2);
    }

    #[test]
    fn test_request_init_builder() {
        let init = RequestInit::new()
            .with_method(Method::POST)
            .with_header("x-token", "abc")
            .with_body("payload");
        assert_eq!(init.method, Method::POST);
        assert_eq!(init.headers.len(), 1);
        assert_eq!(init.body.as_deref(), Some(&b"payload"[..]));
    }
}

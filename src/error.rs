//! Error types for fetch exchanges.
//!
//! Errors are cheap to clone: the error captured by an exchange is handed out every
//! time script code asks for it, so payloads are kept as owned strings rather than
//! wrapping non-`Clone` transport errors.
//!
//! Calling an operation from the wrong [`ResponseState`](crate::types::ResponseState)
//! is not represented here. That kind of misuse is logged and ignored by the exchange.

use crate::bridge::ExchangeId;
use thiserror::Error;

/// Errors produced while driving a fetch exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The HTTP client failed to deliver the request or its body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The exchange was released or cancelled while still in flight.
    #[error("request has been cancelled")]
    RequestCancelled,

    /// The request target could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// No exchange is registered under the given id.
    #[error("exchange not found: {0}")]
    ExchangeNotFound(ExchangeId),

    /// No tokio runtime is available to host exchange tasks.
    #[error("runtime unavailable: {0}")]
    Runtime(String),
}

impl FetchError {
    /// Whether this error came from tearing the exchange down.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FetchError::RequestCancelled)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

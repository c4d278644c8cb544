#![warn(missing_docs)]

//! # fetch_relay: streaming HTTP responses for script bridges
//!
//! This crate relays HTTP responses from a native HTTP client to script code that
//! talks to it through an event bridge. The script side may attach to a response
//! late, detach early, or never read the body at all; the relay buffers and routes
//! body bytes so that none of those cases loses or reorders data.
//!
//! ## Overview
//!
//! An *exchange* is one request/response lifecycle:
//!
//! 1. **Request** - [`NativeRequest`](client::NativeRequest) hands the request to an
//!    [`HttpClient`](client::HttpClient) on a background task
//! 2. **Response head** - status, headers and final URL are captured as [`ResponseInit`]
//! 3. **Body drain** - chunks are buffered until the consumer calls `start_streaming`,
//!    then forwarded live as `didReceiveResponseData` events
//! 4. **Termination** - `didComplete`, a recorded error, or a hard cancel on release
//!
//! The lifecycle is tracked by [`ResponseState`]:
//!
//! ```text
//! Initialized → Started → ResponseReceived → BodyStreamingStarted → BodyStreamingCancelled
//!                                          ↘ BodyCompleted
//! (any non-terminal state) → ErrorReceived
//! ```
//!
//! ## Key Features
//!
//! - **Late attach**: bytes received before `start_streaming` arrive as one flushed event
//! - **Early detach**: `cancel_streaming` silences events while the connection drains
//! - **State waits**: one-shot callbacks or futures for any set of states
//! - **Explicit lifetime**: exchanges live in a registry until released
//! - **Pluggable transport**: any [`HttpClient`](client::HttpClient) + [`ByteSource`](client::ByteSource)
//!
//! ## Usage
//!
//! ```ignore
//! use fetch_relay::{bridge::NetworkFetchModule, ClientConfig, ResponseState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (module, mut events) = NetworkFetchModule::new(ClientConfig::default())?;
//!
//!     let id = module.construct();
//!     module.send_request(&id, "https://example.com/".parse()?)?;
//!     module.wait_for_states(&id, &[ResponseState::ResponseReceived]).await?;
//!     module.start_streaming(&id)?;
//!
//!     while let Some(event) = events.next().await {
//!         println!("{}: {:?}", event.id, event.event);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Lifecycle states, response metadata, events, request options
//! - **[error]** - Error types and result handling
//! - **[response]** - The exchange: state machine, body buffer, body pump
//! - **[client]** - HTTP client seam, `reqwest` backend, request driver
//! - **[bridge]** - Event delivery, exchange registry, module facade

pub mod bridge;
pub mod client;
pub mod error;
pub mod response;
pub mod types;

pub use bridge::{ExchangeId, NetworkFetchModule};
pub use client::{ClientConfig, NativeRequest, ReqwestClient};
pub use error::{FetchError, Result};
pub use response::NativeResponse;
pub use types::{FetchEvent, RequestInit, ResponseInit, ResponseState};

//! Request side of an exchange.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── config          - ClientConfig
//! ├── transport       - HttpClient / ByteSource seam, FetchRequest, HttpResponse
//! ├── reqwest_backend - ReqwestClient, the stock HttpClient
//! └── request         - NativeRequest, issues a request and drives the pump
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HttpClient`] | Anything that can issue a request and resolve with a head |
//! | [`ByteSource`] | Pull-based response body |
//! | [`ReqwestClient`] | `reqwest`-backed client |
//! | [`NativeRequest`] | One request wired to its `NativeResponse` |
//! | [`ClientConfig`] | Client configuration options |
//!
//! # Examples
//!
//! ```
//! use fetch_relay::client::{ClientConfig, ReqwestClient};
//!
//! // Default configuration
//! let client = ReqwestClient::new();
//!
//! // Custom configuration
//! let config = ClientConfig {
//!     connect_timeout_ms: 5000,
//!     ..Default::default()
//! };
//! let client = ReqwestClient::with_config(config);
//! ```

mod config;
mod transport;
mod reqwest_backend;
mod request;

pub use config::ClientConfig;
pub use transport::{ByteSource, FetchRequest, HttpClient, HttpResponse, MemoryBody};
pub use reqwest_backend::ReqwestClient;
pub use request::NativeRequest;

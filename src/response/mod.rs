//! Response side of an exchange.
//!
//! ```text
//! response/
//! ├── sink            - ResponseSink, buffer for bytes nobody asked for yet
//! ├── state           - StateMachine, lifecycle state and one-shot listeners
//! ├── native_response - NativeResponse, the exchange itself
//! └── pump            - background body drain
//! ```
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NativeResponse`] | State, buffer, metadata and error of one exchange |
//! | [`StateMachine`] | Lifecycle state with one-shot listeners |
//! | [`ResponseSink`] | Append-only chunk buffer with one-shot finalize |

mod native_response;
pub(crate) mod pump;
mod sink;
mod state;

pub use native_response::NativeResponse;
pub use sink::ResponseSink;
pub use state::{Notifications, StateCallback, StateMachine};

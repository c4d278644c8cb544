//! Bridge between exchanges and script code.
//!
//! ```text
//! bridge/
//! ├── events   - EventEmitter seam, ExchangeEmitter, EventStream
//! ├── registry - ExchangeId, ExchangeRegistry
//! └── module   - NetworkFetchModule facade
//! ```

mod events;
mod module;
mod registry;

pub use events::{EventEmitter, EventStream, ExchangeEmitter, ExchangeEvent};
pub use module::{NetworkFetchModule, MODULE_NAME};
pub use registry::{ExchangeId, ExchangeRegistry};

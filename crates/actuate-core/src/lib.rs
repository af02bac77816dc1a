//! Action dispatch core.
//!
//! Callers submit loosely structured action requests (a kind, a method, and
//! kind-specific parameters) and receive a structured [`ResultEnvelope`].
//! Requests are validated against a fixed taxonomy before any handler runs,
//! file actions are confined to a configured root directory, and every
//! dispatch can be cancelled.
//!
//! Two kinds are built in:
//!
//! - `file`: `READ`, `WRITE`, `DELETE`, and `LIST` below the root;
//! - `enc`: `ENCODE` (base64, base64url, hex) and `HASH` (sha256, sha512).
//!
//! Embedders either drive a [`Dispatcher`] directly or install one
//! process-wide and call [`do_action`], which returns an awaitable
//! [`ActionTask`].
//!
//! ```no_run
//! use actuate_core::{Dispatcher, install, do_action};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! install(Dispatcher::from_root("/srv/data")?)?;
//! let envelope = do_action(json!({"kind": "file", "method": "READ", "path": "notes.txt"})).await;
//! println!("{}", envelope.to_json_line()?);
//! # Ok(())
//! # }
//! ```

mod adapter;
pub mod dispatch;
pub mod handlers;
pub mod telemetry;

pub use adapter::{AdapterError, do_action, install, install_from, installed};
pub use dispatch::{
    ActionDescriptor, ActionError, ActionFailure, ActionTask, Dispatcher, ErrorKind, Kind,
    KindRegistry, ListEntry, Method, ParamValue, Payload, ResultEnvelope, ValidationError,
};
pub use handlers::{ConfinedRoot, RootError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests;

//! Action dispatch: parsing, routing, execution, and result envelopes.
//!
//! A request is a JSON object naming a kind and a method:
//!
//! ```json
//! {"kind":"file","method":"READ","path":"notes.txt"}
//! ```
//!
//! The [`Dispatcher`] validates it into an [`ActionDescriptor`], looks the
//! pair up in the [`KindRegistry`], runs the handler, and returns a
//! [`ResultEnvelope`]:
//!
//! ```json
//! {"status":"success","payload":{"type":"bytes","value":[104,101,108,108,111]}}
//! ```
//!
//! ## Routing
//!
//! Kind and method tags are matched case-insensitively. Unknown kinds and
//! methods, and requests whose parameters do not fit the registered schema,
//! are rejected before any handler runs.

mod dispatcher;
mod errors;
mod registry;
mod request;
mod response;
mod router;
mod schema;
mod task;

pub use self::dispatcher::Dispatcher;
pub use self::errors::{ActionError, ErrorKind, ValidationError};
pub use self::registry::{KindRegistry, KindRegistryBuilder, RegistryEntry, RegistryError};
pub use self::request::{ActionDescriptor, KIND_FIELD, METHOD_FIELD, parse_json_line};
pub use self::response::{ActionFailure, ListEntry, Payload, ResultEnvelope};
pub use self::router::{EncMethod, FileMethod, Kind, Method};
pub(crate) use self::router::DISPATCH_TARGET;
pub use self::schema::{ParamSchema, ParamShape, ParamSpec, ParamValue, Parameters};
pub use self::task::{ActionTask, runtime_handle};

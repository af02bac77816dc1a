//! Result envelopes returned to callers.
//!
//! Every dispatch resolves to exactly one [`ResultEnvelope`], serialised as a
//! single JSON object:
//!
//! ```json
//! {"status":"success","payload":{"type":"text","value":"aGk="}}
//! {"status":"error","errorKind":"PathEscapesRoot","message":"..."}
//! ```

use serde::Serialize;

use super::errors::{ActionError, ErrorKind};

/// A single directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    /// Path relative to the configured root, using `/` separators.
    pub path: String,
    /// Final path component.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes (zero for directories).
    pub size: u64,
    /// Last modification time in microseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,
}

/// Successful action output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// Raw bytes, for example file contents.
    Bytes(Vec<u8>),
    /// Text, for example an encoding or digest.
    Text(String),
    /// Directory listing.
    Entries(Vec<ListEntry>),
    /// Acknowledgement of a side effect.
    Ack,
}

/// Failure details carried by an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFailure {
    /// Taxonomy tag.
    pub error_kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl From<&ActionError> for ActionFailure {
    fn from(error: &ActionError) -> Self {
        Self {
            error_kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of one dispatched action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultEnvelope {
    /// The handler completed and produced a payload.
    Success {
        /// Handler output.
        payload: Payload,
    },
    /// Validation or execution failed.
    Error(ActionFailure),
}

impl ResultEnvelope {
    /// Wraps a payload in a success envelope.
    pub fn success(payload: Payload) -> Self {
        Self::Success { payload }
    }

    /// Folds an error into an error envelope.
    pub fn failure(error: &ActionError) -> Self {
        Self::Error(ActionFailure::from(error))
    }

    /// Returns `true` for a success envelope.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the payload of a success envelope.
    pub const fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload } => Some(payload),
            Self::Error(_) => None,
        }
    }

    /// Returns the error tag of an error envelope.
    pub const fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Error(failure) => Some(failure.error_kind),
        }
    }

    /// Exit status a driver should report: 0 on success, 2 for internal
    /// failures, 1 otherwise.
    pub const fn exit_status(&self) -> i32 {
        match self.failure_kind() {
            None => 0,
            Some(ErrorKind::Internal) => 2,
            Some(_) => 1,
        }
    }

    /// Serialises the envelope as one JSON line without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns the serializer error. The envelope contains only strings,
    /// integers and booleans, so this does not fail in practice.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Converts the envelope into a `Result` for Rust callers.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionFailure`] of an error envelope.
    pub fn into_result(self) -> Result<Payload, ActionFailure> {
        match self {
            Self::Success { payload } => Ok(payload),
            Self::Error(failure) => Err(failure),
        }
    }
}

impl From<Result<Payload, ActionError>> for ResultEnvelope {
    fn from(outcome: Result<Payload, ActionError>) -> Self {
        match outcome {
            Ok(payload) => Self::success(payload),
            Err(error) => Self::failure(&error),
        }
    }
}

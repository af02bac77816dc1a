//! Error types for action parsing and execution.
//!
//! Every failure the dispatcher can produce maps onto one [`ErrorKind`] tag.
//! Validation failures are detected before any handler runs; the remaining
//! variants describe handler outcomes. Errors never cross the dispatcher
//! boundary as-is: they are folded into a result envelope that keeps the
//! tag and the display message.

use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinError;

/// Stable tag identifying a failure class in result envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The request named no kind, or a kind that is not registered.
    UnknownKind,
    /// The method is missing or not registered for the kind.
    UnknownMethod,
    /// A required parameter was absent.
    MissingParameter,
    /// A parameter had the wrong shape.
    InvalidParameter,
    /// A path resolved outside the configured root.
    PathEscapesRoot,
    /// The target does not exist.
    NotFound,
    /// The filesystem refused access.
    PermissionDenied,
    /// The target is not a regular file.
    IsADirectory,
    /// The action was cancelled before it produced side effects.
    Cancelled,
    /// Any failure not classified above.
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    /// Returns the wire tag for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownKind => "UnknownKind",
            Self::UnknownMethod => "UnknownMethod",
            Self::MissingParameter => "MissingParameter",
            Self::InvalidParameter => "InvalidParameter",
            Self::PathEscapesRoot => "PathEscapesRoot",
            Self::NotFound => "NotFound",
            Self::PermissionDenied => "PermissionDenied",
            Self::IsADirectory => "IsADirectory",
            Self::Cancelled => "Cancelled",
            Self::Internal => "InternalError",
        }
    }

    /// Returns the taxonomy group the tag belongs to.
    pub const fn category(self) -> &'static str {
        match self {
            Self::UnknownKind
            | Self::UnknownMethod
            | Self::MissingParameter
            | Self::InvalidParameter => "ValidationError",
            Self::NotFound | Self::PermissionDenied | Self::IsADirectory => "FileError",
            Self::PathEscapesRoot => "PathEscapesRoot",
            Self::Cancelled => "Cancelled",
            Self::Internal => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Kind field is absent, not a string, or not registered.
    #[error("unknown kind: {kind}")]
    UnknownKind { kind: String },

    /// Method field is absent, not a string, or not registered for the kind.
    #[error("unknown method '{method}' for kind '{kind}'")]
    UnknownMethod { kind: String, method: String },

    /// A required parameter is absent or null.
    #[error("{kind} {method}: missing required parameter '{name}'")]
    MissingParameter {
        kind: &'static str,
        method: &'static str,
        name: &'static str,
    },

    /// A parameter is present but has the wrong shape.
    #[error("{kind} {method}: invalid parameter '{name}': {reason}")]
    InvalidParameter {
        kind: &'static str,
        method: &'static str,
        name: &'static str,
        reason: String,
    },
}

impl ValidationError {
    /// Creates an unknown kind error.
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownKind { kind: kind.into() }
    }

    /// Creates an unknown method error.
    pub fn unknown_method(kind: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            kind: kind.into(),
            method: method.into(),
        }
    }

    /// Creates a missing parameter error.
    pub fn missing_parameter(
        kind: &'static str,
        method: &'static str,
        name: &'static str,
    ) -> Self {
        Self::MissingParameter { kind, method, name }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(
        kind: &'static str,
        method: &'static str,
        name: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            kind,
            method,
            name,
            reason: reason.into(),
        }
    }

    /// Returns the taxonomy tag for this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownKind { .. } => ErrorKind::UnknownKind,
            Self::UnknownMethod { .. } => ErrorKind::UnknownMethod,
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
        }
    }
}

/// Errors surfaced while dispatching an action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The request was rejected before any handler ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Path resolution left the configured root.
    #[error("path '{path}' escapes the configured root")]
    PathEscapesRoot { path: String },

    /// Target does not exist.
    #[error("'{path}': {reason}")]
    NotFound { path: String, reason: String },

    /// Filesystem refused access.
    #[error("'{path}': {reason}")]
    PermissionDenied { path: String, reason: String },

    /// Target is a directory or another non-regular file.
    #[error("'{path}' is not a regular file")]
    IsADirectory { path: String },

    /// Cancellation was observed before side effects occurred.
    #[error("action was cancelled")]
    Cancelled,

    /// Unclassified failure (for example a panicked worker).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ActionError {
    /// Creates a path escape error.
    pub fn path_escapes_root(path: impl Into<String>) -> Self {
        Self::PathEscapesRoot { path: path.into() }
    }

    /// Creates a not found error with the default reason.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::not_found_because(path, "no such file or directory")
    }

    /// Creates a not found error with a custom reason.
    pub fn not_found_because(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a permission denied error.
    pub fn permission_denied(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an "is a directory" error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory { path: path.into() }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classifies a filesystem error raised while acting on `path`.
    pub fn from_io(path: &str, error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::not_found(path),
            io::ErrorKind::NotADirectory => Self::not_found_because(path, error.to_string()),
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                Self::permission_denied(path, error.to_string())
            }
            io::ErrorKind::IsADirectory => Self::is_a_directory(path),
            _ => Self::internal(format!("I/O error for '{path}': {error}")),
        }
    }

    /// Classifies the failure of a blocking worker task.
    pub fn from_join(error: JoinError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::internal("action worker panicked")
        }
    }

    /// Returns the taxonomy tag for this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(error) => error.kind(),
            Self::PathEscapesRoot { .. } => ErrorKind::PathEscapesRoot,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::IsADirectory { .. } => ErrorKind::IsADirectory,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the exit status a driver should report for this error.
    ///
    /// Request and filesystem failures return status 1. Internal failures
    /// return status 2.
    pub const fn exit_status(&self) -> i32 {
        match self.kind() {
            ErrorKind::Internal => 2,
            _ => 1,
        }
    }
}

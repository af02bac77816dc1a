//! Kind and method taxonomy for action routing.
//!
//! Incoming tags are matched case-insensitively against a closed set of
//! kinds and, within each kind, a closed set of methods. Whether a parsed
//! pair is actually served is decided by the kind registry.

use std::fmt;

use super::errors::ValidationError;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::dispatch");

/// Known action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// Filesystem actions confined to the configured root.
    File,
    /// Encoding and hashing of in-request data.
    Enc,
}

impl Kind {
    /// Every kind the taxonomy knows about.
    pub const ALL: [Self; 2] = [Self::File, Self::Enc];

    /// Parses a kind tag (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownKind` if the value does not match any
    /// known kind.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "enc" => Ok(Self::Enc),
            _ => Err(ValidationError::unknown_kind(value)),
        }
    }

    /// Returns the canonical tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Enc => "enc",
        }
    }

    /// Returns every method the taxonomy defines for this kind.
    pub const fn methods(self) -> &'static [Method] {
        match self {
            Self::File => &[
                Method::File(FileMethod::Read),
                Method::File(FileMethod::Write),
                Method::File(FileMethod::Delete),
                Method::File(FileMethod::List),
            ],
            Self::Enc => &[
                Method::Enc(EncMethod::Encode),
                Method::Enc(EncMethod::Decode),
                Method::Enc(EncMethod::Hash),
            ],
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Methods of the `file` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileMethod {
    /// Read a whole file.
    Read,
    /// Create or truncate a file.
    Write,
    /// Remove a file.
    Delete,
    /// List a directory.
    List,
}

/// Methods of the `enc` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EncMethod {
    /// Encode bytes as text.
    Encode,
    /// Decode text back into bytes.
    Decode,
    /// Digest bytes.
    Hash,
}

/// A method scoped to its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// A `file` method.
    File(FileMethod),
    /// An `enc` method.
    Enc(EncMethod),
}

impl Method {
    /// Parses a method tag for `kind` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownMethod` if `kind` has no such method.
    pub fn parse(kind: Kind, value: &str) -> Result<Self, ValidationError> {
        let normalised = value.trim().to_ascii_uppercase();
        kind.methods()
            .iter()
            .copied()
            .find(|method| method.as_str() == normalised)
            .ok_or_else(|| ValidationError::unknown_method(kind.as_str(), value))
    }

    /// Returns the kind this method belongs to.
    pub const fn kind(self) -> Kind {
        match self {
            Self::File(_) => Kind::File,
            Self::Enc(_) => Kind::Enc,
        }
    }

    /// Returns the canonical (upper-case) tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File(FileMethod::Read) => "READ",
            Self::File(FileMethod::Write) => "WRITE",
            Self::File(FileMethod::Delete) => "DELETE",
            Self::File(FileMethod::List) => "LIST",
            Self::Enc(EncMethod::Encode) => "ENCODE",
            Self::Enc(EncMethod::Decode) => "DECODE",
            Self::Enc(EncMethod::Hash) => "HASH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Kind registry mapping `(kind, method)` pairs to handlers and schemas.
//!
//! A [`KindRegistry`] is assembled through a [`KindRegistryBuilder`] and is
//! immutable once built. The process-wide built-in registry is created
//! lazily on first use and shared behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;

use super::router::{EncMethod, FileMethod, Kind, Method};
use super::schema::ParamSchema;
use crate::handlers::{HandlerRef, enc, file};

static GLOBAL: OnceCell<Arc<KindRegistry>> = OnceCell::new();

/// Built-in `(method, handler, schema)` table.
static BUILTIN: [(Method, HandlerRef, &ParamSchema); 7] = [
    (
        Method::File(FileMethod::Read),
        HandlerRef::File,
        &file::READ_SCHEMA,
    ),
    (
        Method::File(FileMethod::Write),
        HandlerRef::File,
        &file::WRITE_SCHEMA,
    ),
    (
        Method::File(FileMethod::Delete),
        HandlerRef::File,
        &file::DELETE_SCHEMA,
    ),
    (
        Method::File(FileMethod::List),
        HandlerRef::File,
        &file::LIST_SCHEMA,
    ),
    (
        Method::Enc(EncMethod::Encode),
        HandlerRef::Enc,
        &enc::ENCODE_SCHEMA,
    ),
    (
        Method::Enc(EncMethod::Decode),
        HandlerRef::Enc,
        &enc::DECODE_SCHEMA,
    ),
    (
        Method::Enc(EncMethod::Hash),
        HandlerRef::Enc,
        &enc::HASH_SCHEMA,
    ),
];

/// Errors raised while assembling a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The pair is already registered.
    #[error("{kind} {method} is already registered")]
    Duplicate { kind: Kind, method: Method },

    /// The method belongs to a different kind.
    #[error("method {method} does not belong to kind {kind}")]
    KindMismatch { kind: Kind, method: Method },

    /// The handler does not serve the kind.
    #[error("handler {handler:?} cannot serve kind {kind}")]
    HandlerMismatch { kind: Kind, handler: HandlerRef },
}

/// Handler reference and schema for one registered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    handler: HandlerRef,
    schema: &'static ParamSchema,
}

impl RegistryEntry {
    /// Handler that executes the pair.
    pub const fn handler(&self) -> HandlerRef {
        self.handler
    }

    /// Schema the pair's parameters are validated against.
    pub const fn schema(&self) -> &'static ParamSchema {
        self.schema
    }
}

/// Accumulates registrations before freezing them into a [`KindRegistry`].
#[derive(Debug, Default)]
pub struct KindRegistryBuilder {
    entries: HashMap<Method, RegistryEntry>,
}

impl KindRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `(kind, method)`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] for a pair that is already
    /// registered, [`RegistryError::KindMismatch`] when `method` belongs to
    /// another kind, and [`RegistryError::HandlerMismatch`] when `handler`
    /// does not serve `kind`.
    pub fn register(
        &mut self,
        kind: Kind,
        method: Method,
        handler: HandlerRef,
        schema: &'static ParamSchema,
    ) -> Result<&mut Self, RegistryError> {
        if method.kind() != kind {
            return Err(RegistryError::KindMismatch { kind, method });
        }
        if !handler.serves(kind) {
            return Err(RegistryError::HandlerMismatch { kind, handler });
        }
        if self.entries.contains_key(&method) {
            return Err(RegistryError::Duplicate { kind, method });
        }
        self.entries
            .insert(method, RegistryEntry { handler, schema });
        Ok(self)
    }

    /// Freezes the registrations.
    #[must_use]
    pub fn build(self) -> KindRegistry {
        KindRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable table of registered actions.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    entries: HashMap<Method, RegistryEntry>,
}

impl KindRegistry {
    /// Starts a new registry.
    #[must_use]
    pub fn builder() -> KindRegistryBuilder {
        KindRegistryBuilder::new()
    }

    /// Builds a registry holding every built-in action.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|&(method, handler, schema)| (method, RegistryEntry { handler, schema }))
            .collect();
        Self { entries }
    }

    /// Returns the process-wide built-in registry.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::builtin())))
    }

    /// Looks up the entry for `(kind, method)`.
    #[must_use]
    pub fn lookup(&self, kind: Kind, method: Method) -> Option<RegistryEntry> {
        if method.kind() != kind {
            return None;
        }
        self.entries.get(&method).copied()
    }

    /// Returns `true` when at least one method of `kind` is registered.
    #[must_use]
    pub fn has_kind(&self, kind: Kind) -> bool {
        self.entries.keys().any(|method| method.kind() == kind)
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<Kind> {
        let mut kinds: Vec<Kind> = Kind::ALL
            .into_iter()
            .filter(|kind| self.has_kind(*kind))
            .collect();
        kinds.sort();
        kinds
    }

    /// Registered methods of `kind`, sorted.
    #[must_use]
    pub fn methods(&self, kind: Kind) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .entries
            .keys()
            .copied()
            .filter(|method| method.kind() == kind)
            .collect();
        methods.sort();
        methods
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

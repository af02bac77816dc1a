//! Dispatcher tying parsing, registry lookup, and handler execution together.

use std::path::Path;
use std::sync::Arc;

use actuate_config::Config;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::ActionError;
use super::registry::KindRegistry;
use super::request::{ActionDescriptor, parse_json_line};
use super::response::{Payload, ResultEnvelope};
use super::router::DISPATCH_TARGET;
use super::task::ActionTask;
use crate::handlers::{ConfinedRoot, HandlerSet, RootError};

/// Routes raw requests to handlers and folds outcomes into envelopes.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<KindRegistry>,
    handlers: HandlerSet,
}

impl Dispatcher {
    /// Creates a dispatcher over the built-in registry, confined to the
    /// configured root.
    ///
    /// # Errors
    ///
    /// Returns [`RootError`] when the root is missing or not a directory.
    pub fn new(config: &Config) -> Result<Self, RootError> {
        Self::with_registry(config, KindRegistry::global())
    }

    /// Creates a dispatcher over a custom registry.
    ///
    /// # Errors
    ///
    /// Returns [`RootError`] when the root is missing or not a directory.
    pub fn with_registry(config: &Config, registry: Arc<KindRegistry>) -> Result<Self, RootError> {
        let root = ConfinedRoot::new(config.root().as_std_path())?;
        Ok(Self::from_parts(registry, root))
    }

    /// Creates a dispatcher over the built-in registry confined to `root`.
    ///
    /// # Errors
    ///
    /// Returns [`RootError`] when the root is missing or not a directory.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, RootError> {
        let root = ConfinedRoot::new(root)?;
        Ok(Self::from_parts(KindRegistry::global(), root))
    }

    fn from_parts(registry: Arc<KindRegistry>, root: ConfinedRoot) -> Self {
        Self {
            registry,
            handlers: HandlerSet::new(root),
        }
    }

    /// Registry used for lookups.
    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Canonical confinement root.
    pub fn root(&self) -> &Path {
        self.handlers.file().root().path()
    }

    /// Parses and validates `raw` without executing it.
    ///
    /// # Errors
    ///
    /// Returns the validation failure as an [`ActionError`].
    pub fn parse(&self, raw: &Value) -> Result<ActionDescriptor, ActionError> {
        ActionDescriptor::parse(raw, &self.registry).map_err(ActionError::from)
    }

    /// Dispatches one request.
    ///
    /// Validation failures return immediately without running a handler.
    /// Cancellation is observed after validation and, for cancellable
    /// methods, while the handler runs.
    pub async fn dispatch(&self, raw: &Value, cancel: &CancellationToken) -> ResultEnvelope {
        let request_id = Uuid::now_v7();
        info!(target: DISPATCH_TARGET, %request_id, "dispatch started");
        let envelope = ResultEnvelope::from(self.run(raw, cancel, request_id).await);
        match envelope.failure_kind() {
            None => info!(target: DISPATCH_TARGET, %request_id, "dispatch succeeded"),
            Some(kind) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %request_id,
                    error_kind = %kind,
                    category = kind.category(),
                    "dispatch failed"
                );
            }
        }
        envelope
    }

    /// Dispatches one request line of JSON text.
    pub async fn dispatch_line(&self, line: &[u8], cancel: &CancellationToken) -> ResultEnvelope {
        match parse_json_line(line) {
            Ok(raw) => self.dispatch(&raw, cancel).await,
            Err(error) => {
                let error = ActionError::from(error);
                warn!(target: DISPATCH_TARGET, error = %error, "rejected malformed request");
                ResultEnvelope::failure(&error)
            }
        }
    }

    /// Spawns a dispatch of `raw` and returns its task.
    ///
    /// The task runs on the current tokio runtime when there is one and on
    /// a shared background runtime otherwise.
    pub fn spawn(self: Arc<Self>, raw: Value) -> ActionTask {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        ActionTask::spawn(cancel, async move { self.dispatch(&raw, &token).await })
    }

    async fn run(
        &self,
        raw: &Value,
        cancel: &CancellationToken,
        request_id: Uuid,
    ) -> Result<Payload, ActionError> {
        let descriptor = self.parse(raw).inspect_err(|error| {
            debug!(target: DISPATCH_TARGET, %request_id, error = %error, "request rejected");
        })?;
        let kind = descriptor.kind();
        let method = descriptor.method();
        let entry = self.registry.lookup(kind, method).ok_or_else(|| {
            ActionError::internal(format!("{kind} {method} vanished from the registry"))
        })?;
        debug!(
            target: DISPATCH_TARGET,
            %request_id,
            %kind,
            %method,
            handler = ?entry.handler(),
            "routing request"
        );

        if cancel.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        self.handlers
            .execute(entry.handler(), descriptor, cancel)
            .await
    }

    #[cfg(test)]
    pub(crate) fn counted_calls(&self) -> usize {
        self.handlers.counted_calls()
    }
}

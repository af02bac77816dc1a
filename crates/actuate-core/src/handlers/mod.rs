//! Action handlers, one per kind.
//!
//! Handlers are selected through the closed [`HandlerRef`] tag stored in the
//! kind registry. [`HandlerSet`] owns one instance of each handler and routes
//! a validated descriptor to the right one.

pub mod enc;
pub mod file;

#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

use crate::dispatch::{ActionDescriptor, ActionError, Kind, Method, Payload};

pub use self::enc::EncHandler;
pub use self::file::{ConfinedRoot, FileHandler, RootError};

/// Identifies the handler a registry entry dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerRef {
    /// [`FileHandler`].
    File,
    /// [`EncHandler`].
    Enc,
    /// Counts invocations without doing any work.
    #[cfg(test)]
    Counting,
}

impl HandlerRef {
    /// Returns `true` when the handler can execute actions of `kind`.
    pub const fn serves(self, kind: Kind) -> bool {
        match self {
            Self::File => matches!(kind, Kind::File),
            Self::Enc => matches!(kind, Kind::Enc),
            #[cfg(test)]
            Self::Counting => true,
        }
    }
}

/// One instance of every handler.
#[derive(Debug, Clone)]
pub struct HandlerSet {
    file: FileHandler,
    enc: EncHandler,
    #[cfg(test)]
    counting: CountingHandler,
}

impl HandlerSet {
    /// Creates the handler set for file actions confined to `root`.
    pub fn new(root: ConfinedRoot) -> Self {
        Self {
            file: FileHandler::new(root),
            enc: EncHandler,
            #[cfg(test)]
            counting: CountingHandler::default(),
        }
    }

    /// File handler.
    pub fn file(&self) -> &FileHandler {
        &self.file
    }

    /// Executes `descriptor` with `handler`.
    ///
    /// # Errors
    ///
    /// Returns the handler's error, or `InternalError` when the handler does
    /// not serve the descriptor's kind.
    pub async fn execute(
        &self,
        handler: HandlerRef,
        descriptor: ActionDescriptor,
        cancel: &CancellationToken,
    ) -> Result<Payload, ActionError> {
        let (kind, method, params) = descriptor.into_parts();
        match (handler, method) {
            (HandlerRef::File, Method::File(method)) => {
                self.file.execute(method, params, cancel).await
            }
            (HandlerRef::Enc, Method::Enc(method)) => self.enc.execute(method, &params),
            #[cfg(test)]
            (HandlerRef::Counting, _) => Ok(self.counting.record()),
            (handler, method) => Err(ActionError::internal(format!(
                "handler {handler:?} cannot execute {kind} {method}"
            ))),
        }
    }

    #[cfg(test)]
    pub(crate) fn counted_calls(&self) -> usize {
        self.counting.calls()
    }
}

/// Test handler that only counts how often it runs.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

#[cfg(test)]
impl CountingHandler {
    fn record(&self) -> Payload {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Payload::Ack
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

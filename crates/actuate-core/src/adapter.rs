//! Process-wide entry point for binding layers.
//!
//! A binding installs one [`Dispatcher`] at start-up and then forwards each
//! request through [`do_action`], awaiting the returned [`ActionTask`] on its
//! own event loop. The envelope's `errorKind` is preserved so the binding can
//! re-raise failures as typed exceptions.

use std::sync::Arc;

use actuate_config::ConfigLoader;
use once_cell::sync::OnceCell;
use ortho_config::OrthoError;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::dispatch::{ActionError, ActionTask, DISPATCH_TARGET, Dispatcher, ResultEnvelope};
use crate::handlers::RootError;

static INSTALLED: OnceCell<Arc<Dispatcher>> = OnceCell::new();

/// Errors raised while installing the process-wide dispatcher.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A dispatcher is already installed.
    #[error("a dispatcher is already installed")]
    AlreadyInstalled,

    /// The configured root could not be opened.
    #[error(transparent)]
    Root(#[from] RootError),

    /// Configuration could not be loaded.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying `ortho_config` failure.
        #[source]
        source: Arc<OrthoError>,
    },
}

/// Installs `dispatcher` as the process-wide dispatcher.
///
/// # Errors
///
/// Returns [`AdapterError::AlreadyInstalled`] on every call after the first.
pub fn install(dispatcher: Dispatcher) -> Result<Arc<Dispatcher>, AdapterError> {
    let dispatcher = Arc::new(dispatcher);
    INSTALLED
        .set(Arc::clone(&dispatcher))
        .map_err(|_| AdapterError::AlreadyInstalled)?;
    info!(
        target: DISPATCH_TARGET,
        root = %dispatcher.root().display(),
        "dispatcher installed"
    );
    Ok(dispatcher)
}

/// Loads configuration through `loader` and installs a dispatcher for it.
///
/// # Errors
///
/// Returns configuration and root errors, or
/// [`AdapterError::AlreadyInstalled`].
pub fn install_from(loader: &dyn ConfigLoader) -> Result<Arc<Dispatcher>, AdapterError> {
    let config = loader
        .load()
        .map_err(|source| AdapterError::Config { source })?;
    install(Dispatcher::new(&config)?)
}

/// Returns the installed dispatcher, if any.
pub fn installed() -> Option<Arc<Dispatcher>> {
    INSTALLED.get().cloned()
}

/// Dispatches `request` through the installed dispatcher.
///
/// Without an installed dispatcher the task resolves to an `InternalError`
/// envelope.
pub fn do_action(request: Value) -> ActionTask {
    match installed() {
        Some(dispatcher) => dispatcher.spawn(request),
        None => ActionTask::ready(ResultEnvelope::failure(&ActionError::internal(
            "no dispatcher installed",
        ))),
    }
}

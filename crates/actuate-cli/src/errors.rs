//! Failures that stop the CLI before it can print a result envelope.

use std::io;
use std::sync::Arc;

use actuate_core::{RootError, TelemetryError};
use ortho_config::OrthoError;
use thiserror::Error;

/// Set-up and output errors raised by the CLI driver.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("failed to load configuration: {0}")]
    Config(#[source] Arc<OrthoError>),

    /// Telemetry could not be initialised.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The configured root could not be opened.
    #[error(transparent)]
    Root(#[from] RootError),

    /// The request could not be read from standard input.
    #[error("failed to read request from stdin: {0}")]
    Input(#[source] io::Error),

    /// The async runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The envelope could not be serialised.
    #[error("failed to serialise result envelope: {0}")]
    Serialise(#[from] serde_json::Error),

    /// The envelope could not be written to stdout.
    #[error("failed to write result envelope: {0}")]
    Output(#[source] io::Error),
}

impl CliError {
    /// Exit status reported for the error.
    pub const fn exit_status(&self) -> i32 {
        2
    }
}

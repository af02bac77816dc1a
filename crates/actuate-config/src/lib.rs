//! Shared configuration for the action dispatch core and its drivers.
//!
//! [`Config`] derives [`OrthoConfig`], so values are merged in layers,
//! lowest precedence first:
//!
//! 1. built-in defaults (see [`default_root`], [`default_log_filter`] and
//!    [`default_log_format`]);
//! 2. a TOML file named by `--config-path` or `ACTUATE_CONFIG_PATH`;
//! 3. `ACTUATE_*` environment variables;
//! 4. command-line flags (`--root`, `--log-filter`, `--log-format`).
//!
//! Drivers pass their own argument list to `Config::load_from_iter`, usually
//! through a [`ConfigLoader`].

mod defaults;
mod loader;
mod logging;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    CONFIG_PROGRAM_NAME, DEFAULT_LOG_FILTER, default_log_filter, default_log_filter_string,
    default_log_format, default_root,
};
pub use loader::{ConfigLoader, StaticConfigLoader, SystemConfigLoader};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for the dispatch core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ACTUATE")]
pub struct Config {
    /// Directory that file actions are confined to.
    #[serde(default = "default_root")]
    #[ortho_config(default = default_root())]
    pub root: Utf8PathBuf,
    /// `tracing` filter directive applied by the telemetry subscriber.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Directory that file actions are confined to.
    pub fn root(&self) -> &Utf8Path {
        self.root.as_path()
    }

    /// `tracing` filter directive.
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

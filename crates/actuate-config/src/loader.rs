//! Configuration loaders used by the drivers.
//!
//! The [`ConfigLoader`] seam lets drivers and tests swap the layered
//! `ortho_config` merge for a fixed configuration.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};

use crate::{CONFIG_PROGRAM_NAME, Config};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns the `ortho_config` error when any layer is invalid.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that merges defaults, the configuration file, `ACTUATE_*`
/// variables and the supplied configuration flags.
#[derive(Debug, Clone)]
pub struct SystemConfigLoader {
    args: Vec<OsString>,
}

impl SystemConfigLoader {
    /// Creates a loader with no configuration flags.
    pub fn new() -> Self {
        Self::with_args(std::iter::empty::<OsString>())
    }

    /// Creates a loader for configuration flags such as
    /// `["--root", "/srv/data"]`. The program name is prepended.
    pub fn with_args<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        let args = std::iter::once(OsString::from(CONFIG_PROGRAM_NAME))
            .chain(args.into_iter().map(Into::into))
            .collect();
        Self { args }
    }

    /// Argument list handed to `Config::load_from_iter`.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl Default for SystemConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(self.args.iter().cloned())
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps a ready-made configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

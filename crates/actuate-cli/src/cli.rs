//! Command-line argument definitions.

use std::ffi::OsString;

use actuate_config::LogFormat;
use camino::Utf8PathBuf;
use clap::Parser;

/// Request argument that selects standard input.
pub(crate) const STDIN_MARKER: &str = "-";

/// Dispatches one action request and prints its result envelope.
#[derive(Parser, Debug)]
#[command(name = "actuate", version)]
pub(crate) struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub(crate) config_path: Option<Utf8PathBuf>,
    /// Directory file actions are confined to.
    #[arg(long, value_name = "DIR")]
    pub(crate) root: Option<Utf8PathBuf>,
    /// Tracing filter directive (for example `actuate_core=debug`).
    #[arg(long, value_name = "FILTER")]
    pub(crate) log_filter: Option<String>,
    /// Log output format (`json` or `compact`).
    #[arg(long, value_name = "FORMAT")]
    pub(crate) log_format: Option<LogFormat>,
    /// JSON request, or `-` to read it from standard input.
    #[arg(value_name = "REQUEST")]
    pub(crate) request: String,
}

impl Cli {
    /// Configuration flags in the form `Config::load_from_iter` expects.
    ///
    /// The request argument is left out; only flags the user passed are
    /// forwarded so lower layers keep their values otherwise.
    pub(crate) fn config_arguments(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        let mut push = |flag: &str, value: OsString| {
            args.push(OsString::from(flag));
            args.push(value);
        };
        if let Some(path) = &self.config_path {
            push("--config-path", path.as_os_str().to_owned());
        }
        if let Some(root) = &self.root {
            push("--root", root.as_os_str().to_owned());
        }
        if let Some(filter) = &self.log_filter {
            push("--log-filter", OsString::from(filter));
        }
        if let Some(format) = self.log_format {
            push("--log-format", OsString::from(format.to_string()));
        }
        args
    }

    /// Returns `true` when the request should be read from standard input.
    pub(crate) fn reads_stdin(&self) -> bool {
        self.request == STDIN_MARKER
    }
}

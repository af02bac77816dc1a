use std::env;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Program name placed at the front of argument lists handed to the loader.
pub const CONFIG_PROGRAM_NAME: &str = "actuate";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value for serde and merge defaults.
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Root directory used when no layer names one.
///
/// Falls back to `.` when the working directory is unavailable or is not
/// valid UTF-8.
pub fn default_root() -> Utf8PathBuf {
    env::current_dir()
        .ok()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

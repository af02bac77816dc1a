//! Log output formats selectable through `log_format`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
///
/// Parsing ignores case, so `ACTUATE_LOG_FORMAT=Compact` is accepted.
///
/// ```rust
/// use actuate_config::LogFormat;
///
/// let format: LogFormat = "COMPACT".parse().expect("known format");
/// assert_eq!(format, LogFormat::Compact);
/// assert!(format.supports_colour());
/// assert!(!LogFormat::Json.supports_colour());
/// ```
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

impl LogFormat {
    /// Whether ANSI colour codes may be written on a terminal. JSON lines
    /// stay free of escapes so log shippers can parse them.
    pub const fn supports_colour(self) -> bool {
        matches!(self, Self::Compact)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

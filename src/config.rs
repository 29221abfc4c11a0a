//! Module for the settings of a batch run

use std::{path::PathBuf, time::Duration};

use crate::{Error, domain::LogFormat, error::config_error};

/// Settings of one batch run. The defaults make the tool runnable without arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Directory scanned for log files
    pub input_dir: PathBuf,
    /// Directory receiving one table per log, plus `merge/` when merging
    pub output_dir: PathBuf,
    /// Whether rows are also appended to per-(sampling rate, distance) aggregate tables
    pub merge: bool,
    /// Pause after each file
    pub slow_down: Duration,
    /// Field delimiter of the written tables
    pub delimiter: u8,
    pub format: LogFormat,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("base_txt"),
            output_dir: PathBuf::from("preprocessed_csv"),
            merge: false,
            slow_down: Duration::from_millis(300),
            delimiter: b',',
            format: LogFormat::FrameSync,
        }
    }
}

/// Parses a separator argument. Only single ASCII characters can be used as delimiters.
pub fn parse_delimiter(separator: &str) -> Result<u8, Error> {
    match separator.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' => Ok(*byte),
        _ => Err(config_error(format!(
            "separator must be a single ASCII character other than a quote or newline, got {separator:?}"
        ))),
    }
}

/// Converts a delay in (fractional) seconds into a [`Duration`], rejecting negative or non-finite values.
pub fn parse_slow_down(seconds: f64) -> Result<Duration, Error> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| config_error(format!("slow-down must be a non-negative number of seconds, got {seconds}")))
}

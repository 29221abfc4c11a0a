//! Module defining the errors which are exposed to the users of the crate

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading a log or writing a table failed. Always fatal for the batch.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a stream without a known path failed
    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// Writing or reading a delimited table failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The run was configured with values that cannot be honoured, e.g., a multi-character separator
    #[error("configuration error: {0}")]
    Config(String),

    /// A table handed to the analysis routines lacks a column they need
    #[error("missing column: {0}")]
    MissingColumn(String),
}

pub(crate) fn io_error(path: impl AsRef<Path>, source: std::io::Error) -> Error {
    Error::Io {
        path: path.as_ref().to_path_buf(),
        source,
    }
}

pub(crate) fn config_error(message: impl Into<String>) -> Error {
    Error::Config(message.into())
}

//! Error types for the order-book depth terminal.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the order-book depth terminal.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing data).
    #[error("Data error: {0}")]
    Data(String),

    /// A source file could not be read in full (vanished, locked, not UTF-8).
    #[error("File unavailable: {}: {reason}", path.display())]
    FileUnavailable { path: PathBuf, reason: String },

    /// A source file no longer carries the order-book columns.
    #[error("Missing columns in {}: {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading/writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a file-unavailable error.
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::FileUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error only affects a single source file.
    ///
    /// Recoverable errors are shown as "no data for this file" while other
    /// files stay usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FileUnavailable { .. } | Error::MissingColumns { .. } | Error::Csv(_)
        )
    }
}

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Load errors – anything that stops a dataset from being built
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0} (expected csv, json or parquet)")]
    UnsupportedFormat(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}, column '{column}': {reason} (got '{value}')")]
    InvalidValue {
        /// 1-based data row, not counting a header line.
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("malformed {format} data: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

impl LoadError {
    pub(crate) fn parse(format: &'static str, err: impl std::fmt::Display) -> Self {
        LoadError::Parse {
            format,
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation errors
// ---------------------------------------------------------------------------

/// Raised when a caller names a grouping or measure that does not exist.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("invalid argument: unknown {kind} '{value}'")]
    InvalidArgument { kind: &'static str, value: String },
}

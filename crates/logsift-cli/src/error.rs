//! CLI error types.

use logsift::SearchError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine rejected the request.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

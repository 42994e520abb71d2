//! Error types for the search engine.
//!
//! [`SearchError`] is what callers of the engine see. [`RejectReason`] is not
//! an error in that sense: it describes why one ingestion record was dropped
//! and is only ever collected into a [`LoadReport`](crate::store::LoadReport).

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::query::QueryError;

/// Errors returned by search and aggregation calls.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The cursor was negative or did not fit in memory offsets.
    #[error("invalid cursor {0}: must be a non-negative integer")]
    InvalidCursor(i64),

    /// The page size was zero, negative or too large.
    #[error("invalid limit {0}: must be at least 1")]
    InvalidLimit(i64),

    /// The time range ends before it starts.
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange {
        /// Requested lower bound.
        start: DateTime<Utc>,
        /// Requested upper bound.
        end: DateTime<Utc>,
    },

    /// The time bucket width was not a positive number of minutes.
    #[error("invalid bucket width {0}: must be at least 1 minute")]
    InvalidBucketWidth(i64),

    /// The query text could not be parsed.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// Reading log input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Returns true for errors caused by a malformed request.
    ///
    /// Validation errors are the caller's to fix; they never leave the engine
    /// in a different state than before the call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Io(_))
    }

    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCursor(_) => "invalid_cursor",
            Self::InvalidLimit(_) => "invalid_limit",
            Self::InvalidTimeRange { .. } => "invalid_time_range",
            Self::InvalidBucketWidth(_) => "invalid_bucket_width",
            Self::InvalidQuery(_) => "invalid_query",
            Self::Io(_) => "io",
        }
    }
}

/// Why a single ingestion record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The line bytes are not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// The line is not valid JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// The JSON value is not an object.
    #[error("record is not a JSON object")]
    NotAnObject,

    /// A required field was not provided.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field that must hold a string holds something else.
    #[error("field {0} must be a string")]
    NotAString(String),

    /// The timestamp is not a recognised date-time.
    #[error("unparsable timestamp: {0}")]
    InvalidTimestamp(String),

    /// The level is outside `{trace, debug, info, warn, error}`.
    #[error("unknown level: {0}")]
    InvalidLevel(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SearchError>;

//! Core types for log search.
//!
//! This module provides:
//! - [`LogLevel`] - Closed set of severity levels
//! - [`LogEntry`] - Validated, immutable log record
//! - [`TimeRange`] - Inclusive time window
//! - [`FieldFilters`] - Structured conjunction of typed filter clauses

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::error::RejectReason;

/// Wire name of the timestamp field.
pub const TIMESTAMP_FIELD: &str = "@timestamp";
/// Wire name of the level field.
pub const LEVEL_FIELD: &str = "@level";
/// Wire name of the message field.
pub const MESSAGE_FIELD: &str = "@message";

/// Log severity levels, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed debugging information
    Trace = 0,
    /// Debugging information
    Debug = 1,
    /// General information
    Info = 2,
    /// Warning conditions
    Warn = 3,
    /// Error conditions
    Error = 4,
}

impl LogLevel {
    /// All levels, most verbose first.
    pub const ALL: [Self; 5] = [Self::Trace, Self::Debug, Self::Info, Self::Warn, Self::Error];

    /// Returns the string representation of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the five level names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown level '{0}', expected one of trace, debug, info, warn, error")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

/// A validated log entry.
///
/// Entries only come out of the ingestion path or the builder, both of which
/// enforce the schema, so holders can rely on every field being well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// When the log was emitted
    #[serde(rename = "@timestamp", serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Severity level
    #[serde(rename = "@level")]
    pub level: LogLevel,
    /// The log message
    #[serde(rename = "@message")]
    pub message: String,
    /// Free-form string attributes (`tf_run_id`, `provider`, ...)
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

/// Renders a timestamp the way entries are written on the wire.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

impl LogEntry {
    /// Creates a new log entry builder.
    #[must_use]
    pub fn builder() -> LogEntryBuilder {
        LogEntryBuilder::default()
    }

    /// Looks up a field by its query name.
    ///
    /// `@timestamp`, `@level` and `@message` address the schema fields; every
    /// other name addresses an attribute. Returns `None` when the entry has no
    /// such field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            TIMESTAMP_FIELD => Some(Cow::Owned(format_timestamp(&self.timestamp))),
            LEVEL_FIELD => Some(Cow::Borrowed(self.level.as_str())),
            MESSAGE_FIELD => Some(Cow::Borrowed(&self.message)),
            _ => self.attributes.get(name).map(|v| Cow::Borrowed(v.as_str())),
        }
    }

    /// Returns a single attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Inclusive time window. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the time range (inclusive)
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// End of the time range (inclusive)
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a closed range `[start, end]`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Creates a range from `start` onwards.
    #[must_use]
    pub const fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Creates a range up to and including `end`.
    #[must_use]
    pub const fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Checks if a timestamp falls within this range, both ends inclusive.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }

    /// Returns true if the start is after the end.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
    }
}

/// Programmatic filters, applied without going through query text.
///
/// Each populated clause must hold; within a clause any listed value matches.
/// Empty clauses impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilters {
    /// Accepted levels (empty means all levels)
    #[serde(default)]
    pub levels: Vec<LogLevel>,
    /// Accepted values per field, matched exactly
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldFilters {
    /// Creates an empty filter that matches all logs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an accepted level.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.levels.push(level);
        self
    }

    /// Adds an accepted value for a field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.entry(field.into()).or_default().push(value.into());
        self
    }

    /// Returns true if no clause constrains anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.fields.values().all(Vec::is_empty)
    }

    /// Checks if the entry satisfies every clause.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if !self.levels.is_empty() && !self.levels.contains(&entry.level) {
            return false;
        }

        self.fields.iter().all(|(field, accepted)| {
            accepted.is_empty()
                || entry
                    .field(field)
                    .is_some_and(|value| accepted.iter().any(|a| *a == value))
        })
    }
}

/// Builder for constructing log entries.
#[derive(Debug, Default)]
pub struct LogEntryBuilder {
    timestamp: Option<DateTime<Utc>>,
    level: Option<LogLevel>,
    message: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl LogEntryBuilder {
    /// Sets the timestamp.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the log level.
    #[must_use]
    pub const fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builds the log entry.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field.
    pub fn build(self) -> Result<LogEntry, RejectReason> {
        let timestamp = self
            .timestamp
            .ok_or(RejectReason::MissingField(TIMESTAMP_FIELD))?;
        let level = self.level.ok_or(RejectReason::MissingField(LEVEL_FIELD))?;
        let message = self
            .message
            .ok_or(RejectReason::MissingField(MESSAGE_FIELD))?;

        Ok(LogEntry {
            timestamp,
            level,
            message,
            attributes: self.attributes,
        })
    }
}

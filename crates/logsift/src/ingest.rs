//! Record validation for NDJSON ingestion.
//!
//! This module provides:
//! - [`RecordParser`] - Turns raw JSON records into validated [`LogEntry`] values
//! - [`parse_timestamp`] - The timestamp formats accepted on input

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::RejectReason;
use crate::types::{LEVEL_FIELD, LogEntry, LogLevel, MESSAGE_FIELD, TIMESTAMP_FIELD};

/// Attributes that must be strings when present.
pub const STRICT_STRING_FIELDS: [&str; 5] =
    ["tf_run_id", "provider", "resource_type", "resource_name", "error"];

/// Parses a timestamp in any accepted input format.
///
/// RFC 3339 with an offset is preferred. Offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]` is read as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Validator for raw log records.
#[derive(Debug, Clone)]
pub struct RecordParser {
    strict_fields: Vec<String>,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser {
    /// Creates a parser that enforces the Terraform attribute types.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strict_fields: STRICT_STRING_FIELDS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Requires another attribute to be a string when present.
    #[must_use]
    pub fn with_strict_field(mut self, field: impl Into<String>) -> Self {
        self.strict_fields.push(field.into());
        self
    }

    /// Parses a single NDJSON line.
    ///
    /// # Errors
    ///
    /// Returns the reason the line cannot become a [`LogEntry`].
    pub fn parse_line(&self, line: &str) -> Result<LogEntry, RejectReason> {
        let value: Value = serde_json::from_str(line.trim())
            .map_err(|e| RejectReason::MalformedJson(e.to_string()))?;
        self.parse_value(value)
    }

    /// Validates an already-decoded JSON record.
    ///
    /// # Errors
    ///
    /// Returns the reason the record cannot become a [`LogEntry`].
    pub fn parse_value(&self, value: Value) -> Result<LogEntry, RejectReason> {
        let Value::Object(mut obj) = value else {
            return Err(RejectReason::NotAnObject);
        };

        let timestamp = take_string(&mut obj, TIMESTAMP_FIELD)?;
        let timestamp =
            parse_timestamp(&timestamp).ok_or(RejectReason::InvalidTimestamp(timestamp))?;

        let level = take_string(&mut obj, LEVEL_FIELD)?;
        let level: LogLevel = level
            .parse()
            .map_err(|_| RejectReason::InvalidLevel(level))?;

        let message = take_string(&mut obj, MESSAGE_FIELD)?;

        let mut builder = LogEntry::builder()
            .timestamp(timestamp)
            .level(level)
            .message(message);

        for (key, value) in obj {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                _ if self.is_strict(&key) => return Err(RejectReason::NotAString(key)),
                other => other.to_string(),
            };
            builder = builder.attribute(key, text);
        }

        builder.build()
    }

    fn is_strict(&self, key: &str) -> bool {
        self.strict_fields.iter().any(|f| f == key)
    }
}

/// Removes a required string field from the record.
fn take_string(obj: &mut Map<String, Value>, field: &'static str) -> Result<String, RejectReason> {
    match obj.remove(field) {
        None | Some(Value::Null) => Err(RejectReason::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(RejectReason::NotAString(field.to_string())),
    }
}

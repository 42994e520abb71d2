//! Engine configuration.

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

/// Default page size when a request omits `limit`.
pub const DEFAULT_LIMIT: usize = 20;

/// Default time bucket width in minutes.
pub const DEFAULT_BUCKET_MINUTES: u32 = 5;

/// Configuration for the search engine.
///
/// Fields are only set through the `with_*` builders, which keep the default
/// page size and bucket width at one or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    default_limit: usize,
    default_bucket_minutes: u32,
    label_offset: FixedOffset,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            default_bucket_minutes: DEFAULT_BUCKET_MINUTES,
            label_offset: utc(),
        }
    }
}

/// A UTC offset string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid UTC offset '{0}', expected Z, UTC or +HH:MM")]
pub struct ParseOffsetError(pub String);

fn utc() -> FixedOffset {
    Utc.fix()
}

impl EngineConfig {
    /// Page size used when a request omits `limit`.
    #[must_use]
    pub const fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Bucket width used when an aggregation omits `bucketMinutes`.
    #[must_use]
    pub const fn default_bucket_minutes(&self) -> u32 {
        self.default_bucket_minutes
    }

    /// Offset in which time bucket labels are rendered.
    #[must_use]
    pub const fn label_offset(&self) -> &FixedOffset {
        &self.label_offset
    }

    /// Sets the default page size. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    /// Sets the default bucket width. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_default_bucket_minutes(mut self, minutes: u32) -> Self {
        self.default_bucket_minutes = minutes.max(1);
        self
    }

    /// Sets the offset used for time bucket labels.
    #[must_use]
    pub const fn with_label_offset(mut self, offset: FixedOffset) -> Self {
        self.label_offset = offset;
        self
    }

    /// Parses `Z`, `UTC` or a signed `HH:MM` offset.
    ///
    /// # Errors
    ///
    /// Returns [`ParseOffsetError`] for anything else, including offsets of a
    /// day or more.
    pub fn parse_offset(raw: &str) -> Result<FixedOffset, ParseOffsetError> {
        let err = || ParseOffsetError(raw.to_string());
        let trimmed = raw.trim();

        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(utc());
        }

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(err()),
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(err)?;
        let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hours) || !two_digits(minutes) {
            return Err(err());
        }
        let hours: i32 = hours.parse().map_err(|_| err())?;
        let minutes: i32 = minutes.parse().map_err(|_| err())?;
        if minutes >= 60 {
            return Err(err());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(err)
    }
}

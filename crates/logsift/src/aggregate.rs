//! Count-based aggregations over a filtered entry set.
//!
//! This module provides:
//! - [`aggregate_by_level`] - One bucket per level present
//! - [`aggregate_over_time`] - One bucket per non-empty fixed-width window
//! - [`BucketWidth`] - Validated window width

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_BUCKET_MINUTES;
use crate::error::{Result, SearchError};
use crate::types::{LogEntry, LogLevel, format_timestamp};

/// Which aggregation to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    /// Count per level
    Level,
    /// Count per time window
    Time,
}

impl AggregationKind {
    /// Returns the string representation of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Time => "time",
        }
    }
}

impl std::fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of entries at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelBucket {
    /// The level
    pub level: LogLevel,
    /// Entries at this level
    pub count: usize,
}

/// Number of entries in one time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    /// `HH:mm` label of the window start in the label offset
    pub time: String,
    /// Entries in this window
    pub count: usize,
    /// Window start, RFC 3339
    #[serde(serialize_with = "serialize_start")]
    pub start: DateTime<Utc>,
}

fn serialize_start<S: serde::Serializer>(
    start: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(start))
}

/// Either kind of bucket, for callers that handle both uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AggregationBucket {
    /// A level bucket
    Level(LevelBucket),
    /// A time bucket
    Time(TimeBucket),
}

impl AggregationBucket {
    /// Entries counted in this bucket.
    #[must_use]
    pub const fn count(&self) -> usize {
        match self {
            Self::Level(b) => b.count,
            Self::Time(b) => b.count,
        }
    }
}

/// Counts entries per level, ordered by severity.
///
/// Levels with no entries do not appear.
pub fn aggregate_by_level<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> Vec<LevelBucket> {
    let mut counts: BTreeMap<LogLevel, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.level).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(level, count)| LevelBucket { level, count })
        .collect()
}

/// Width of a time bucket, at least one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketWidth {
    millis: i64,
}

impl Default for BucketWidth {
    fn default() -> Self {
        Self {
            millis: i64::from(DEFAULT_BUCKET_MINUTES) * 60_000,
        }
    }
}

impl BucketWidth {
    /// Creates a width of `minutes` minutes.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBucketWidth`] if `minutes` is below 1 or
    /// too large to express in milliseconds.
    pub fn minutes(minutes: i64) -> Result<Self> {
        if minutes < 1 {
            return Err(SearchError::InvalidBucketWidth(minutes));
        }
        let millis = minutes
            .checked_mul(60_000)
            .ok_or(SearchError::InvalidBucketWidth(minutes))?;
        Ok(Self { millis })
    }

    /// Width in whole minutes.
    #[must_use]
    pub const fn as_minutes(&self) -> i64 {
        self.millis / 60_000
    }

    /// Start of the epoch-aligned window containing `ts`.
    #[must_use]
    pub fn floor(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let millis = ts.timestamp_millis();
        let start = millis - millis.rem_euclid(self.millis);
        DateTime::from_timestamp_millis(start).unwrap_or(ts)
    }
}

/// Counts entries per epoch-aligned window, oldest window first.
///
/// Windows are keyed by their start instant, so two windows with the same
/// `HH:mm` label on different days stay separate. Empty windows do not appear.
pub fn aggregate_over_time<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
    width: BucketWidth,
    label_offset: &FixedOffset,
) -> Vec<TimeBucket> {
    let mut counts: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(width.floor(entry.timestamp)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(start, count)| TimeBucket {
            time: start.with_timezone(label_offset).format("%H:%M").to_string(),
            count,
            start,
        })
        .collect()
}

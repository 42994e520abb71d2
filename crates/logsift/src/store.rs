//! Immutable in-memory log storage.
//!
//! This module provides:
//! - [`LogStore`] - The validated entry set for one session
//! - [`LogLoader`] - Incremental builder that validates raw records
//! - [`LoadReport`] - What was accepted and what was rejected, and why
//!
//! A store is built once and never mutated afterwards, so sharing it behind an
//! [`Arc`] is enough for concurrent readers.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{RejectReason, Result};
use crate::ingest::RecordParser;
use crate::types::LogEntry;

/// A record dropped during loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRejected {
    /// Input the record was read from, when it was loaded from a named source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// 1-based line number (or record position) within its source.
    pub line: usize,
    /// Why the record was dropped.
    #[serde(serialize_with = "serialize_reason")]
    pub reason: RejectReason,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &RejectReason,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Outcome of loading a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Number of records that became entries.
    pub accepted: usize,
    /// Records that were dropped.
    pub rejected: Vec<RecordRejected>,
}

impl LoadReport {
    /// Returns true if every record was accepted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Shared handle to a store.
pub type SharedLogStore = Arc<LogStore>;

/// Validated, read-only set of log entries.
///
/// Entries are kept in load order; the position of an entry is its sequence
/// number and breaks ties when sorting by timestamp.
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    entries: Vec<LogEntry>,
    report: LoadReport,
}

impl LogStore {
    /// Builds a store from already-decoded JSON records.
    ///
    /// Invalid records are dropped and listed in the [`LoadReport`].
    #[must_use]
    pub fn load(records: impl IntoIterator<Item = Value>) -> Self {
        let mut loader = LogLoader::new();
        for record in records {
            loader.push_value(record);
        }
        loader.finish()
    }

    /// Builds a store from validated entries.
    #[must_use]
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        let report = LoadReport {
            accepted: entries.len(),
            rejected: Vec::new(),
        };
        Self { entries, report }
    }

    /// Builds a store from NDJSON text.
    #[must_use]
    pub fn from_ndjson_str(text: &str) -> Self {
        let mut loader = LogLoader::new();
        for line in text.lines() {
            loader.push_line(line);
        }
        loader.finish()
    }

    /// Builds a store from an NDJSON reader.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading fails. Bad records never fail the load.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut loader = LogLoader::new();
        loader.read_from(reader)?;
        Ok(loader.finish())
    }

    /// Builds a store from an NDJSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Returns all entries in load order.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Iterates over entries in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the load report.
    #[must_use]
    pub const fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Wraps the store for sharing across threads.
    #[must_use]
    pub fn into_shared(self) -> SharedLogStore {
        Arc::new(self)
    }
}

impl<'a> IntoIterator for &'a LogStore {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Incremental store builder.
///
/// Several sources can be fed into one loader; line numbers restart at 1 for
/// every [`read_from`](Self::read_from) or [`read_source`](Self::read_source)
/// call, and rejections from a named source carry that name.
#[derive(Debug, Default)]
pub struct LogLoader {
    parser: RecordParser,
    entries: Vec<LogEntry>,
    rejected: Vec<RecordRejected>,
    source: Option<String>,
    line: usize,
}

impl LogLoader {
    /// Creates a loader with the default record parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader with a custom record parser.
    #[must_use]
    pub fn with_parser(parser: RecordParser) -> Self {
        Self {
            parser,
            ..Self::default()
        }
    }

    /// Validates one NDJSON line. Blank lines are skipped.
    pub fn push_line(&mut self, line: &str) {
        self.line += 1;
        if line.trim().is_empty() {
            return;
        }
        let result = self.parser.parse_line(line);
        self.record(result);
    }

    /// Validates one decoded JSON record.
    pub fn push_value(&mut self, value: Value) {
        self.line += 1;
        let result = self.parser.parse_value(value);
        self.record(result);
    }

    /// Reads every line from an unnamed `reader`, numbering lines from 1.
    ///
    /// A line that is not valid UTF-8 is rejected like any other bad record.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails. Entries read before the failure are
    /// kept.
    pub fn read_from<R: BufRead>(&mut self, reader: R) -> Result<()> {
        self.source = None;
        self.read_lines(reader)
    }

    /// Reads every line from `reader`, tagging rejections with `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails. Entries read before the failure are
    /// kept.
    pub fn read_source<R: BufRead>(
        &mut self,
        source: impl Into<String>,
        reader: R,
    ) -> Result<()> {
        self.source = Some(source.into());
        self.read_lines(reader)
    }

    fn read_lines<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        self.line = 0;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            match std::str::from_utf8(&buf) {
                Ok(line) => self.push_line(line),
                Err(_) => {
                    self.line += 1;
                    self.record(Err(RejectReason::InvalidUtf8));
                }
            }
        }
    }

    fn record(&mut self, result: std::result::Result<LogEntry, RejectReason>) {
        match result {
            Ok(entry) => self.entries.push(entry),
            Err(reason) => {
                warn!(source = ?self.source, line = self.line, %reason, "rejected log record");
                self.rejected.push(RecordRejected {
                    source: self.source.clone(),
                    line: self.line,
                    reason,
                });
            }
        }
    }

    /// Finishes loading and returns the store.
    #[must_use]
    pub fn finish(self) -> LogStore {
        let report = LoadReport {
            accepted: self.entries.len(),
            rejected: self.rejected,
        };
        info!(
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "log store loaded"
        );
        LogStore {
            entries: self.entries,
            report,
        }
    }
}

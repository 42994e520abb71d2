//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use logsift::{AggregationBucket, LogEntry, SearchResponse};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// One page of search results, with the cursor it was requested at.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutput {
    /// The engine response.
    #[serde(flatten)]
    pub response: SearchResponse,
    /// Offset of the first row on this page.
    #[serde(skip)]
    pub cursor: usize,
}

fn attributes_column(entry: &LogEntry) -> String {
    entry
        .attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl TableDisplay for SearchOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let response = &self.response;
        if response.logs.is_empty() {
            if response.total == 0 {
                writeln!(writer, "No matching logs")?;
            } else {
                writeln!(writer, "No logs on this page ({} matching)", response.total)?;
            }
            return Ok(());
        }

        // Header
        writeln!(
            writer,
            "{:<24}  {:<5}  {:<48}  {}",
            "TIMESTAMP", "LEVEL", "MESSAGE", "ATTRIBUTES"
        )?;
        writeln!(writer, "{}", "─".repeat(100))?;

        // Rows
        for entry in &response.logs {
            writeln!(
                writer,
                "{:<24}  {:<5}  {:<48}  {}",
                logsift::types::format_timestamp(&entry.timestamp),
                entry.level,
                truncate(&entry.message, 48),
                attributes_column(entry)
            )?;
        }

        writeln!(writer)?;
        let first = self.cursor + 1;
        let last = self.cursor + response.logs.len();
        write!(writer, "Showing {first}-{last} of {}", response.total)?;
        if let Some(next) = response.next_cursor {
            write!(writer, " (next cursor: {next})")?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

/// Aggregation buckets, serialized as a bare array.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AggregationOutput(pub Vec<AggregationBucket>);

impl TableDisplay for AggregationOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let Some(first) = self.0.first() else {
            writeln!(writer, "No matching logs")?;
            return Ok(());
        };

        match first {
            AggregationBucket::Level(_) => {
                writeln!(writer, "{:<8}  {:>8}", "LEVEL", "COUNT")?;
                writeln!(writer, "{}", "─".repeat(18))?;
            }
            AggregationBucket::Time(_) => {
                writeln!(writer, "{:<8}  {:>8}  {}", "TIME", "COUNT", "WINDOW START")?;
                writeln!(writer, "{}", "─".repeat(44))?;
            }
        }

        for bucket in &self.0 {
            match bucket {
                AggregationBucket::Level(b) => {
                    writeln!(writer, "{:<8}  {:>8}", b.level, b.count)?;
                }
                AggregationBucket::Time(b) => writeln!(
                    writer,
                    "{:<8}  {:>8}  {}",
                    b.time,
                    b.count,
                    logsift::types::format_timestamp(&b.start)
                )?,
            }
        }

        let total: usize = self.0.iter().map(AggregationBucket::count).sum();
        writeln!(writer)?;
        writeln!(writer, "Total: {total} log(s) in {} bucket(s)", self.0.len())?;
        Ok(())
    }
}

/// Truncate a string to at most `max_chars` characters, marking the cut.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars > 3 {
        let kept: String = s.chars().take(max_chars - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_chars).collect()
    }
}

//! Command-line argument parsing with clap.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use logsift::{
    AggregationKind, EngineConfig, FieldFilters, LogLevel, ParseLevelError, ParseOffsetError,
    SearchRequest, TimeRange,
};

use crate::error::CliError;

/// logsift - search and aggregate structured NDJSON logs.
#[derive(Parser, Debug, Clone)]
#[command(name = "logsift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// NDJSON log file to load. Repeat to load several; stdin is read when omitted.
    #[arg(long = "file", value_name = "PATH", env = "LOGSIFT_FILE")]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, env = "LOGSIFT_FORMAT", default_value_t = Format::Table)]
    pub format: Format,

    /// UTC offset used to label time buckets (Z, UTC or +HH:MM).
    #[arg(long, value_name = "OFFSET", env = "LOGSIFT_UTC_OFFSET", value_parser = parse_offset)]
    pub utc_offset: Option<FixedOffset>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Search logs, newest first, one page at a time.
    Search(SearchArgs),

    /// Count matching logs per level or per time window.
    Aggregate(AggregateArgs),

    /// Answer JSON requests read from stdin, one per line.
    ///
    /// Requests look like `{"op":"search","query":"@level:error"}` or
    /// `{"op":"aggregate","kind":"time","bucketMinutes":5}`.
    Serve,
}

/// Filters shared by `search` and `aggregate`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Query text, e.g. `resource_name:"web_server" AND @level:error`.
    #[arg(short, long, default_value = "*")]
    pub query: String,

    /// Only logs at or after this time (RFC 3339).
    #[arg(long, value_name = "TIME", value_parser = parse_time)]
    pub from: Option<DateTime<Utc>>,

    /// Only logs at or before this time (RFC 3339).
    #[arg(long, value_name = "TIME", value_parser = parse_time)]
    pub to: Option<DateTime<Utc>>,

    /// Only logs at this level. Repeat to accept several levels.
    #[arg(short, long, value_parser = parse_level)]
    pub level: Vec<LogLevel>,

    /// Only logs whose field has this value (KEY=VALUE). Repeat to combine.
    #[arg(long, value_name = "KEY=VALUE")]
    pub field: Vec<String>,
}

impl FilterArgs {
    /// Builds the engine request described by these flags.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidArgument`] for a `--field` without `=`.
    pub fn to_request(&self) -> Result<SearchRequest, CliError> {
        let mut filters = FieldFilters::new();
        for level in &self.level {
            filters = filters.with_level(*level);
        }
        for field in &self.field {
            let (key, value) = field.split_once('=').ok_or_else(|| {
                CliError::InvalidArgument(format!(
                    "invalid field filter: {field}, expected KEY=VALUE"
                ))
            })?;
            if key.is_empty() {
                return Err(CliError::InvalidArgument(format!(
                    "invalid field filter: {field}, key is empty"
                )));
            }
            filters = filters.with_field(key, value);
        }

        let mut request = SearchRequest::new(self.query.clone()).with_filters(filters);
        if self.from.is_some() || self.to.is_some() {
            request = request.with_time_range(TimeRange {
                start: self.from,
                end: self.to,
            });
        }
        Ok(request)
    }
}

/// Arguments for the search command.
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Filters.
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Offset of the first result.
    #[arg(short, long, allow_negative_numbers = true)]
    pub cursor: Option<i64>,

    /// Maximum results per page.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
}

/// Which aggregation to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AggregateKind {
    /// Count per level.
    Level,
    /// Count per time window.
    Time,
}

impl From<AggregateKind> for AggregationKind {
    fn from(kind: AggregateKind) -> Self {
        match kind {
            AggregateKind::Level => Self::Level,
            AggregateKind::Time => Self::Time,
        }
    }
}

/// Arguments for the aggregate command.
#[derive(Args, Debug, Clone)]
pub struct AggregateArgs {
    /// Aggregation to compute.
    #[arg(value_enum)]
    pub kind: AggregateKind,

    /// Filters.
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Time bucket width in minutes.
    #[arg(short, long, allow_negative_numbers = true)]
    pub bucket_minutes: Option<i64>,
}

fn parse_offset(raw: &str) -> Result<FixedOffset, ParseOffsetError> {
    EngineConfig::parse_offset(raw)
}

fn parse_level(raw: &str) -> Result<LogLevel, ParseLevelError> {
    raw.parse()
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    logsift::parse_timestamp(raw).ok_or_else(|| format!("invalid timestamp '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filter_args_build_request() {
        let args = FilterArgs {
            query: "failed".into(),
            from: Some(Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 1).single().expect("valid")),
            to: None,
            level: vec![LogLevel::Warn, LogLevel::Error],
            field: vec!["resource_name=web_server".into(), "note=a=b".into()],
        };
        let req = args.to_request().expect("valid args");

        assert_eq!(req.query, "failed");
        assert_eq!(req.filters.levels, vec![LogLevel::Warn, LogLevel::Error]);
        assert_eq!(req.filters.fields["resource_name"], vec!["web_server".to_string()]);
        assert_eq!(req.filters.fields["note"], vec!["a=b".to_string()]);
        let range = req.time_range.expect("range set");
        assert!(range.start.is_some());
        assert!(range.end.is_none());
    }

    #[test]
    fn filter_args_without_range() {
        let req = FilterArgs {
            query: "*".into(),
            ..FilterArgs::default()
        }
        .to_request()
        .expect("valid args");
        assert!(req.time_range.is_none());
        assert!(req.filters.is_empty());
    }

    #[test]
    fn filter_args_reject_bad_field() {
        for bad in ["resource_name", "=web_server"] {
            let args = FilterArgs {
                field: vec![bad.into()],
                ..FilterArgs::default()
            };
            let err = args.to_request().expect_err("invalid field");
            assert!(err.to_string().contains("invalid field filter"));
        }
    }

    #[test]
    fn time_parser_accepts_naive_utc() {
        let ts = parse_time("2025-09-01T10:00:00").expect("valid");
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).single().expect("valid"));
        assert!(parse_time("noon").is_err());
    }
}

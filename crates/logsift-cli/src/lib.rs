//! # logsift-cli
//!
//! Command-line front end for the `logsift` engine.
//!
//! Provides commands for:
//! - Paginated log search with query text, time range and field filters
//! - Level and time bucket aggregation
//! - A line-delimited JSON request loop for other processes
//!
//! # Architecture
//!
//! Logs are loaded once from `--file` (or stdin) into an immutable
//! [`logsift::LogStore`]; every command then runs against a
//! [`logsift::SearchEngine`] over that store.
//!
//! ```text
//! ┌──────────┐   NDJSON    ┌──────────┐  requests   ┌──────────────┐
//! │  files   │────────────►│ LogStore │◄────────────│ SearchEngine │
//! └──────────┘             └──────────┘             └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{AggregateArgs, AggregateKind, Cli, Commands, FilterArgs, Format, SearchArgs};
pub use error::CliError;
pub use output::OutputFormat;

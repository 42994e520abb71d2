//! # logsift
//!
//! In-memory search and aggregation over structured log entries.
//!
//! This crate provides:
//!
//! - [`LogStore`] - Validated, read-only entry set loaded from NDJSON
//! - [`Query`] - Compiled `field:"value" AND ...` predicate
//! - [`FieldFilters`] - Structured filters that bypass query text
//! - [`SearchEngine`] - Filtering, newest-first sorting and cursor pagination
//! - [`aggregate_by_level`] / [`aggregate_over_time`] - Count reductions
//!
//! ## Example
//!
//! ```rust
//! use logsift::{AggregationKind, LogStore, SearchEngine, SearchRequest};
//!
//! let store = LogStore::from_ndjson_str(concat!(
//!     r#"{"@timestamp":"2025-09-01T10:00:00Z","@level":"info","@message":"plan started"}"#,
//!     "\n",
//!     r#"{"@timestamp":"2025-09-01T10:00:04Z","@level":"error","@message":"apply failed","resource_name":"web_server"}"#,
//! ));
//! let engine = SearchEngine::new(store.into_shared());
//!
//! let page = engine
//!     .search(&SearchRequest::new(r#"resource_name:"web_server""#))
//!     .unwrap();
//! assert_eq!(page.total, 1);
//!
//! let buckets = engine
//!     .aggregate(&SearchRequest::default(), AggregationKind::Level, None)
//!     .unwrap();
//! assert_eq!(buckets.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod query;
pub mod store;
pub mod types;

// Re-export main types
pub use aggregate::{
    AggregationBucket, AggregationKind, BucketWidth, LevelBucket, TimeBucket, aggregate_by_level,
    aggregate_over_time,
};
pub use config::{EngineConfig, ParseOffsetError};
pub use engine::{SearchEngine, SearchRequest, SearchResponse};
pub use error::{RejectReason, Result, SearchError};
pub use ingest::{RecordParser, parse_timestamp};
pub use query::{Query, QueryError, QueryErrorKind};
pub use store::{LoadReport, LogLoader, LogStore, RecordRejected, SharedLogStore};
pub use types::{FieldFilters, LogEntry, LogEntryBuilder, LogLevel, ParseLevelError, TimeRange};

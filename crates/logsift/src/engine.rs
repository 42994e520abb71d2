//! Search and aggregation over a shared store.
//!
//! This module provides:
//! - [`SearchRequest`] - Caller-owned request value
//! - [`SearchResponse`] - One page of results plus totals
//! - [`SearchEngine`] - Stateless executor over a [`SharedLogStore`]
//!
//! Every call runs the same pipeline: validate, compile the query, filter by
//! predicate, structured filters and time range, then either sort and slice a
//! page or reduce into buckets.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{
    AggregationBucket, AggregationKind, BucketWidth, LevelBucket, TimeBucket,
    aggregate_by_level as count_levels, aggregate_over_time as count_windows,
};
use crate::config::EngineConfig;
use crate::error::{Result, SearchError};
use crate::query::Query;
use crate::store::SharedLogStore;
use crate::types::{FieldFilters, LogEntry, TimeRange};

fn default_query() -> String {
    "*".to_string()
}

/// A search request.
///
/// Missing fields take their defaults: query `*`, cursor 0 and the engine's
/// default limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Query text
    #[serde(default = "default_query")]
    pub query: String,
    /// Inclusive time window
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    /// Offset of the first result
    #[serde(default)]
    pub cursor: Option<i64>,
    /// Maximum results per page
    #[serde(default)]
    pub limit: Option<i64>,
    /// Structured filters, ANDed with the query
    #[serde(default)]
    pub filters: FieldFilters,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: default_query(),
            time_range: None,
            cursor: None,
            limit: None,
            filters: FieldFilters::default(),
        }
    }
}

impl SearchRequest {
    /// Creates a request for `query`.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Restricts results to a time window.
    #[must_use]
    pub const fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Sets the page offset.
    #[must_use]
    pub const fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the structured filters.
    #[must_use]
    pub fn with_filters(mut self, filters: FieldFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Entries on this page, newest first
    pub logs: Vec<LogEntry>,
    /// Number of entries matching the request before pagination
    pub total: usize,
    /// Cursor of the next page, if there is one
    pub next_cursor: Option<usize>,
}

/// A validated request, ready to run.
struct Plan<'r> {
    query: Query,
    time_range: Option<TimeRange>,
    filters: &'r FieldFilters,
    cursor: usize,
    limit: usize,
}

impl Plan<'_> {
    fn accepts(&self, entry: &LogEntry) -> bool {
        self.time_range.is_none_or(|range| range.contains(entry.timestamp))
            && self.filters.matches(entry)
            && self.query.matches(entry)
    }
}

/// Executes requests against a store.
///
/// Cloning is cheap; clones share the store.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    store: SharedLogStore,
    config: EngineConfig,
}

impl SearchEngine {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(store: SharedLogStore) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Creates an engine with a custom configuration.
    #[must_use]
    pub const fn with_config(store: SharedLogStore, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Returns the store.
    #[must_use]
    pub const fn store(&self) -> &SharedLogStore {
        &self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn plan<'r>(&self, request: &'r SearchRequest) -> Result<Plan<'r>> {
        let cursor = request.cursor.unwrap_or(0);
        let cursor = usize::try_from(cursor).map_err(|_| SearchError::InvalidCursor(cursor))?;

        let limit = match request.limit {
            None => self.config.default_limit(),
            Some(limit) if limit < 1 => return Err(SearchError::InvalidLimit(limit)),
            Some(limit) => usize::try_from(limit).map_err(|_| SearchError::InvalidLimit(limit))?,
        };

        if let Some(TimeRange {
            start: Some(start),
            end: Some(end),
        }) = request.time_range
        {
            if start > end {
                return Err(SearchError::InvalidTimeRange { start, end });
            }
        }

        let query = Query::parse(&request.query)?;

        Ok(Plan {
            query,
            time_range: request.time_range,
            filters: &request.filters,
            cursor,
            limit,
        })
    }

    fn matching<'s>(&'s self, plan: &Plan<'_>) -> impl Iterator<Item = &'s LogEntry> {
        self.store.iter().filter(move |entry| plan.accepts(entry))
    }

    /// Returns every entry matching the request, newest first.
    ///
    /// Entries with equal timestamps keep their load order. Cursor and limit
    /// are validated but not applied.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed request.
    pub fn filtered(&self, request: &SearchRequest) -> Result<Vec<&LogEntry>> {
        let plan = self.plan(request)?;
        let mut entries: Vec<&LogEntry> = self.matching(&plan).collect();
        entries.sort_by_key(|entry| Reverse(entry.timestamp));
        Ok(entries)
    }

    /// Runs a search and returns one page.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed request.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let plan = self.plan(request)?;
        let mut matches: Vec<&LogEntry> = self.matching(&plan).collect();
        matches.sort_by_key(|entry| Reverse(entry.timestamp));

        let total = matches.len();
        let end = plan.cursor.saturating_add(plan.limit);
        let logs: Vec<LogEntry> = matches
            .into_iter()
            .skip(plan.cursor)
            .take(plan.limit)
            .cloned()
            .collect();
        let next_cursor = (end < total).then_some(end);

        debug!(
            query = %plan.query,
            total,
            cursor = plan.cursor,
            returned = logs.len(),
            "search"
        );

        Ok(SearchResponse {
            logs,
            total,
            next_cursor,
        })
    }

    /// Counts matching entries per level.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed request.
    pub fn aggregate_by_level(&self, request: &SearchRequest) -> Result<Vec<LevelBucket>> {
        let plan = self.plan(request)?;
        let buckets = count_levels(self.matching(&plan));
        debug!(query = %plan.query, buckets = buckets.len(), "aggregate by level");
        Ok(buckets)
    }

    /// Counts matching entries per time window.
    ///
    /// `bucket_minutes` falls back to the configured default.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed request or a width below
    /// one minute.
    pub fn aggregate_over_time(
        &self,
        request: &SearchRequest,
        bucket_minutes: Option<i64>,
    ) -> Result<Vec<TimeBucket>> {
        let width = BucketWidth::minutes(
            bucket_minutes.unwrap_or_else(|| i64::from(self.config.default_bucket_minutes())),
        )?;
        let plan = self.plan(request)?;
        let buckets = count_windows(self.matching(&plan), width, self.config.label_offset());
        debug!(
            query = %plan.query,
            minutes = width.as_minutes(),
            buckets = buckets.len(),
            "aggregate over time"
        );
        Ok(buckets)
    }

    /// Runs either aggregation.
    ///
    /// `bucket_minutes` is ignored for [`AggregationKind::Level`].
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed request.
    pub fn aggregate(
        &self,
        request: &SearchRequest,
        kind: AggregationKind,
        bucket_minutes: Option<i64>,
    ) -> Result<Vec<AggregationBucket>> {
        Ok(match kind {
            AggregationKind::Level => self
                .aggregate_by_level(request)?
                .into_iter()
                .map(AggregationBucket::Level)
                .collect(),
            AggregationKind::Time => self
                .aggregate_over_time(request, bucket_minutes)?
                .into_iter()
                .map(AggregationBucket::Time)
                .collect(),
        })
    }
}

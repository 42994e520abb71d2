//! Serve command implementation.
//!
//! Reads one JSON request per input line and writes one JSON response per
//! output line. A bad request produces an error response; the loop goes on
//! until the input ends.

use std::io::{BufRead, Write};

use logsift::{AggregationBucket, AggregationKind, SearchEngine, SearchRequest, SearchResponse};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CliError;

/// Operation named by a request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// Paginated search
    Search,
    /// Bucket counts
    Aggregate,
}

/// A request line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServeRequest {
    /// What to do.
    pub op: Op,
    /// Aggregation kind; required when `op` is `aggregate`.
    #[serde(default)]
    pub kind: Option<AggregationKind>,
    /// Time bucket width in minutes.
    #[serde(default)]
    pub bucket_minutes: Option<i64>,
    /// The search part of the request.
    #[serde(flatten)]
    pub request: SearchRequest,
}

/// Successful payload of a response line.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Result of a search
    Search(SearchResponse),
    /// Result of an aggregation
    Buckets(Vec<AggregationBucket>),
}

/// Failure detail of a response line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable error kind.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

/// A response line: `{"ok": ...}` or `{"error": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServeResponse {
    /// The request succeeded
    Ok(Payload),
    /// The request failed
    Error(ErrorBody),
}

impl ServeResponse {
    fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error(ErrorBody {
            kind: kind.into(),
            message: message.into(),
        })
    }
}

/// Handler for the serve command.
pub struct ServeCommand<'a> {
    engine: &'a SearchEngine,
}

impl<'a> ServeCommand<'a> {
    /// Creates a new serve command handler.
    #[must_use]
    pub const fn new(engine: &'a SearchEngine) -> Self {
        Self { engine }
    }

    /// Answers a single request line.
    #[must_use]
    pub fn handle_line(&self, line: &str) -> ServeResponse {
        let request: ServeRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => return ServeResponse::error("bad_request", e.to_string()),
        };
        debug!(op = ?request.op, query = %request.request.query, "serve request");

        let result = match request.op {
            Op::Search => self.engine.search(&request.request).map(Payload::Search),
            Op::Aggregate => {
                let Some(kind) = request.kind else {
                    return ServeResponse::error(
                        "bad_request",
                        "aggregate requests need a kind of level or time",
                    );
                };
                self.engine
                    .aggregate(&request.request, kind, request.bucket_minutes)
                    .map(Payload::Buckets)
            }
        };

        match result {
            Ok(payload) => ServeResponse::Ok(payload),
            Err(e) => ServeResponse::error(e.kind(), e.to_string()),
        }
    }

    /// Runs the request loop until `input` ends.
    ///
    /// Blank lines are ignored. A line that is not valid UTF-8 gets a
    /// `bad_request` response. Output is flushed after every response.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading or writing fails.
    pub fn execute<R: BufRead, W: Write>(
        &self,
        mut input: R,
        out: &mut W,
    ) -> Result<(), CliError> {
        let mut handled = 0usize;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line),
                Err(e) => {
                    ServeResponse::error("bad_request", format!("request is not valid UTF-8: {e}"))
                }
            };
            serde_json::to_writer(&mut *out, &response)
                .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
            writeln!(out)?;
            out.flush()?;
            handled += 1;
        }
        info!(handled, "input closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsift::LogStore;
    use serde_json::{Value, json};
    use std::io::Cursor;

    const LOGS: &str = r#"{"@timestamp":"2025-09-01T10:00:00.000Z","@level":"info","@message":"Terraform run started","tf_run_id":"12345"}
{"@timestamp":"2025-09-01T10:00:02.000Z","@level":"info","@message":"Resource creation started","resource_name":"web_server"}
{"@timestamp":"2025-09-01T10:00:04.000Z","@level":"error","@message":"Failed to create resource","resource_name":"web_server"}
"#;

    fn engine() -> SearchEngine {
        SearchEngine::new(LogStore::from_ndjson_str(LOGS).into_shared())
    }

    fn answer(line: &str) -> Value {
        let engine = engine();
        serde_json::to_value(ServeCommand::new(&engine).handle_line(line)).expect("serialize")
    }

    #[test]
    fn search_request() {
        let resp = answer(r#"{"op":"search","query":"resource_name:\"web_server\"","limit":1}"#);
        assert_eq!(resp["ok"]["total"], 2);
        assert_eq!(resp["ok"]["nextCursor"], 1);
        assert_eq!(resp["ok"]["logs"][0]["@message"], "Failed to create resource");
    }

    #[test]
    fn search_request_with_time_range_and_filters() {
        let resp = answer(
            r#"{"op":"search","timeRange":{"start":"2025-09-01T10:00:01Z","end":"2025-09-01T10:00:04Z"},"filters":{"levels":["info"]}}"#,
        );
        assert_eq!(resp["ok"]["total"], 1);
        assert!(resp["ok"]["nextCursor"].is_null());
    }

    #[test]
    fn aggregate_request() {
        let resp = answer(r#"{"op":"aggregate","kind":"time","bucketMinutes":5}"#);
        assert_eq!(
            resp,
            json!({"ok": [{"time": "10:00", "count": 3, "start": "2025-09-01T10:00:00.000Z"}]})
        );
    }

    #[test]
    fn aggregate_without_kind_is_bad_request() {
        let resp = answer(r#"{"op":"aggregate"}"#);
        assert_eq!(resp["error"]["kind"], "bad_request");
    }

    #[test]
    fn malformed_line_is_bad_request() {
        assert_eq!(answer("{nope")["error"]["kind"], "bad_request");
        assert_eq!(answer(r#"{"op":"delete"}"#)["error"]["kind"], "bad_request");
    }

    #[test]
    fn validation_errors_carry_engine_kind() {
        let resp = answer(r#"{"op":"search","cursor":-1}"#);
        assert_eq!(resp["error"]["kind"], "invalid_cursor");

        let resp = answer(r#"{"op":"search","query":"a OR b"}"#);
        assert_eq!(resp["error"]["kind"], "invalid_query");
        assert!(
            resp["error"]["message"]
                .as_str()
                .is_some_and(|m| m.contains("offset 2"))
        );
    }

    #[test]
    fn loop_answers_every_line_and_survives_errors() {
        let engine = engine();
        let input = Cursor::new(
            "{\"op\":\"search\",\"limit\":0}\n\n{\"op\":\"aggregate\",\"kind\":\"level\"}\n",
        );
        let mut out = Vec::new();
        ServeCommand::new(&engine)
            .execute(input, &mut out)
            .expect("loop runs");

        let lines: Vec<Value> = String::from_utf8(out)
            .expect("utf-8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["kind"], "invalid_limit");
        assert_eq!(
            lines[1],
            json!({"ok": [{"level": "info", "count": 2}, {"level": "error", "count": 1}]})
        );
    }

    #[test]
    fn loop_answers_after_invalid_utf8_line() {
        let engine = engine();
        let mut input = b"{\"op\":\"search\"}\n".to_vec();
        input.extend_from_slice(b"{\"op\":\"search\",\"query\":\"\xff\"}\n");
        input.extend_from_slice(b"{\"op\":\"search\",\"query\":\"@level:error\"}\n");

        let mut out = Vec::new();
        ServeCommand::new(&engine)
            .execute(Cursor::new(input), &mut out)
            .expect("loop runs");

        let lines: Vec<Value> = String::from_utf8(out)
            .expect("utf-8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["ok"]["total"], 3);
        assert_eq!(lines[1]["error"]["kind"], "bad_request");
        assert_eq!(lines[2]["ok"]["total"], 1);
    }
}

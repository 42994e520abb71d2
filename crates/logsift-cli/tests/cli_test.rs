//! End-to-end tests for the `logsift` binary.
//!
//! These tests verify:
//! 1. Loading from files and stdin, tolerating malformed lines
//! 2. Search and aggregate output in both formats
//! 3. The serve request loop
//! 4. Exit codes for bad input

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../logsift/tests/fixtures/terraform.ndjson")
}

fn logsift() -> Command {
    let mut cmd = Command::cargo_bin("logsift").expect("binary builds");
    cmd.env_remove("LOGSIFT_FILE")
        .env_remove("LOGSIFT_FORMAT")
        .env_remove("LOGSIFT_UTC_OFFSET")
        .env_remove("RUST_LOG");
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("valid json")
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_search_table_output() {
    logsift()
        .arg("--file")
        .arg(fixture())
        .args(["search", "--query", r#"resource_name:"web_server""#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to create resource"))
        .stdout(predicate::str::contains("Showing 1-3 of 3"));
}

#[test]
fn test_search_json_pagination() {
    let json = json_stdout(
        logsift()
            .arg("--file")
            .arg(fixture())
            .args(["--format", "json", "search", "--limit", "2", "--cursor", "2"]),
    );
    assert_eq!(json["total"], 5);
    assert_eq!(json["nextCursor"], 4);
    assert_eq!(json["logs"][0]["@timestamp"], "2025-09-01T10:00:02.000Z");
}

#[test]
fn test_search_reads_stdin() {
    let json = json_stdout(
        logsift()
            .args(["--format", "json", "search", "--level", "error"])
            .write_stdin(std::fs::read_to_string(fixture()).expect("fixture")),
    );
    assert_eq!(json["total"], 1);
}

#[test]
fn test_search_time_range_and_field() {
    let json = json_stdout(
        logsift()
            .arg("--file")
            .arg(fixture())
            .args([
                "--format",
                "json",
                "search",
                "--from",
                "2025-09-01T10:00:01Z",
                "--to",
                "2025-09-01T10:00:03Z",
                "--field",
                "resource_name=web_server",
            ]),
    );
    assert_eq!(json["total"], 2);
}

#[test]
fn test_file_from_environment() {
    let json = json_stdout(
        logsift()
            .env("LOGSIFT_FILE", fixture())
            .env("LOGSIFT_FORMAT", "json")
            .args(["search", "--query", "*"]),
    );
    assert_eq!(json["total"], 5);
}

// ============================================================================
// Aggregate
// ============================================================================

#[test]
fn test_aggregate_time_single_bucket() {
    let json = json_stdout(
        logsift()
            .arg("--file")
            .arg(fixture())
            .args(["--format", "json", "aggregate", "time", "--bucket-minutes", "5"]),
    );
    assert_eq!(
        json,
        serde_json::json!([{"time": "10:00", "count": 5, "start": "2025-09-01T10:00:00.000Z"}])
    );
}

#[test]
fn test_aggregate_time_label_offset() {
    logsift()
        .arg("--file")
        .arg(fixture())
        .args(["--utc-offset", "+02:00", "aggregate", "time"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12:00"));
}

#[test]
fn test_aggregate_level_table() {
    logsift()
        .arg("--file")
        .arg(fixture())
        .args(["aggregate", "level"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LEVEL"))
        .stdout(predicate::str::contains("Total: 5 log(s) in 4 bucket(s)"));
}

// ============================================================================
// Serve
// ============================================================================

#[test]
fn test_serve_answers_each_line() {
    let input = concat!(
        r#"{"op":"search","query":"@level:\"error\""}"#,
        "\n",
        "garbage\n",
        r#"{"op":"aggregate","kind":"level"}"#,
        "\n",
    );
    let output = logsift()
        .arg("--file")
        .arg(fixture())
        .arg("serve")
        .write_stdin(input)
        .output()
        .expect("runs");
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .expect("utf-8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["ok"]["total"], 1);
    assert_eq!(lines[1]["error"]["kind"], "bad_request");
    assert_eq!(lines[2]["ok"].as_array().map(Vec::len), Some(4));
}

#[test]
fn test_serve_requires_file() {
    logsift()
        .arg("serve")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--file"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_invalid_query_fails() {
    logsift()
        .arg("--file")
        .arg(fixture())
        .args(["search", "--query", "a OR b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid query"));
}

#[test]
fn test_invalid_limit_fails() {
    logsift()
        .arg("--file")
        .arg(fixture())
        .args(["search", "--limit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid limit"));
}

#[test]
fn test_missing_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    logsift()
        .arg("--file")
        .arg(dir.path().join("absent.ndjson"))
        .args(["search"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot open"));
}

#[test]
fn test_malformed_lines_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mixed.ndjson");
    std::fs::write(
        &path,
        "{\"@timestamp\":\"2025-09-01T10:00:00Z\",\"@level\":\"info\",\"@message\":\"ok\"}\n{oops\n",
    )
    .expect("write");

    let json = json_stdout(
        logsift()
            .arg("--file")
            .arg(&path)
            .args(["--format", "json", "search"]),
    );
    assert_eq!(json["total"], 1);
}

#[test]
fn test_invalid_utf8_line_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("corrupt.ndjson");
    let mut data = std::fs::read(fixture()).expect("fixture");
    data.extend_from_slice(b"\n{\"@message\":\"\xff\xfe bad\"}\n");
    std::fs::write(&path, data).expect("write");

    let json = json_stdout(
        logsift()
            .arg("--file")
            .arg(&path)
            .args(["--format", "json", "search"]),
    );
    assert_eq!(json["total"], 5);
}

#[test]
fn test_serve_survives_invalid_utf8_request() {
    let mut input = b"{\"op\":\"search\",\"query\":\"\xff\"}\n".to_vec();
    input.extend_from_slice(b"{\"op\":\"search\",\"limit\":1}\n");
    let output = logsift()
        .arg("--file")
        .arg(fixture())
        .arg("serve")
        .write_stdin(input)
        .output()
        .expect("runs");
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .expect("utf-8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["error"]["kind"], "bad_request");
    assert_eq!(lines[1]["ok"]["nextCursor"], 1);
}

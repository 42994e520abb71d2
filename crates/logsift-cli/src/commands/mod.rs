//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`search`] - Paginated search
//! - [`aggregate`] - Level and time bucket counts
//! - [`serve`] - Line-delimited JSON request loop

pub mod aggregate;
pub mod search;
pub mod serve;

pub use aggregate::AggregateCommand;
pub use search::SearchCommand;
pub use serve::ServeCommand;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use logsift::{LogLoader, LogStore};
use tracing::info;

use crate::error::CliError;

/// Loads every file into one store, or `stdin` when no file is given.
///
/// # Errors
///
/// Returns an error if a file cannot be opened or read.
pub fn load_store<R: BufRead>(files: &[PathBuf], stdin: R) -> Result<LogStore, CliError> {
    let mut loader = LogLoader::new();

    if files.is_empty() {
        info!("reading logs from stdin");
        loader.read_from(stdin)?;
    }
    for path in files {
        info!(path = %path.display(), "reading logs");
        let file = File::open(path).map_err(|e| {
            CliError::InvalidArgument(format!("cannot open {}: {e}", path.display()))
        })?;
        loader.read_source(path.display().to_string(), BufReader::new(file))?;
    }

    Ok(loader.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LINE: &str = r#"{"@timestamp":"2025-09-01T10:00:00Z","@level":"info","@message":"hello"}"#;

    #[test]
    fn load_from_stdin_when_no_files() {
        let store = load_store(&[], Cursor::new(format!("{LINE}\n{LINE}\n"))).expect("load");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn load_concatenates_files_and_ignores_stdin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.ndjson");
        let b = dir.path().join("b.ndjson");
        std::fs::write(&a, format!("{LINE}\n")).expect("write");
        std::fs::write(&b, format!("{LINE}\nbroken\n")).expect("write");

        let store = load_store(&[a, b.clone()], Cursor::new(LINE)).expect("load");
        assert_eq!(store.len(), 2);
        assert_eq!(store.report().rejected.len(), 1);
        assert_eq!(store.report().rejected[0].line, 2);
        assert_eq!(
            store.report().rejected[0].source.as_deref(),
            Some(b.display().to_string().as_str())
        );
    }

    #[test]
    fn invalid_utf8_in_file_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corrupt.ndjson");
        let mut data = format!("{LINE}\n").into_bytes();
        data.extend_from_slice(b"\xff\xfe\n");
        data.extend_from_slice(format!("{LINE}\n").as_bytes());
        std::fs::write(&path, data).expect("write");

        let store = load_store(&[path], Cursor::new("")).expect("load");
        assert_eq!(store.len(), 2);
        assert_eq!(store.report().rejected.len(), 1);
        assert_eq!(store.report().rejected[0].line, 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_store(&[dir.path().join("nope.ndjson")], Cursor::new(""))
            .expect_err("missing file");
        assert!(err.to_string().contains("cannot open"));
    }
}

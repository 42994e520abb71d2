//! Search command implementation.

use std::io::Write;

use logsift::SearchEngine;

use crate::cli::SearchArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, SearchOutput};

/// Handler for the search command.
pub struct SearchCommand<'a> {
    engine: &'a SearchEngine,
}

impl<'a> SearchCommand<'a> {
    /// Creates a new search command handler.
    #[must_use]
    pub const fn new(engine: &'a SearchEngine) -> Self {
        Self { engine }
    }

    /// Executes the search command.
    ///
    /// # Errors
    ///
    /// Returns error if the arguments are invalid or output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &SearchArgs,
    ) -> Result<(), CliError> {
        let mut request = args.filter.to_request()?;
        request.cursor = args.cursor;
        request.limit = args.limit;

        let response = self.engine.search(&request)?;
        let output = SearchOutput {
            cursor: usize::try_from(args.cursor.unwrap_or(0)).unwrap_or(0),
            response,
        };
        format.write(out, &output)
    }
}

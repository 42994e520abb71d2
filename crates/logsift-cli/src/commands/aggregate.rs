//! Aggregate command implementation.

use std::io::Write;

use logsift::SearchEngine;

use crate::cli::AggregateArgs;
use crate::error::CliError;
use crate::output::{AggregationOutput, OutputFormat};

/// Handler for the aggregate command.
pub struct AggregateCommand<'a> {
    engine: &'a SearchEngine,
}

impl<'a> AggregateCommand<'a> {
    /// Creates a new aggregate command handler.
    #[must_use]
    pub const fn new(engine: &'a SearchEngine) -> Self {
        Self { engine }
    }

    /// Executes the aggregate command.
    ///
    /// # Errors
    ///
    /// Returns error if the arguments are invalid or output fails.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &AggregateArgs,
    ) -> Result<(), CliError> {
        let request = args.filter.to_request()?;
        let buckets = self
            .engine
            .aggregate(&request, args.kind.into(), args.bucket_minutes)?;
        format.write(out, &AggregationOutput(buckets))
    }
}

//! logsift CLI binary entrypoint.
//!
//! This is the main entry point for the `logsift` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use logsift::{EngineConfig, SearchEngine};
use logsift_cli::cli::{Cli, Commands};
use logsift_cli::commands::{AggregateCommand, SearchCommand, ServeCommand, load_store};
use logsift_cli::output::OutputFormat;
use logsift_cli::CliError;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if matches!(cli.command, Commands::Serve) && cli.files.is_empty() {
        return Err(CliError::InvalidArgument(
            "serve reads requests from stdin, so logs must come from --file or LOGSIFT_FILE".into(),
        ));
    }

    let store = load_store(&cli.files, io::stdin().lock())?;

    let mut config = EngineConfig::default();
    if let Some(offset) = cli.utc_offset {
        config = config.with_label_offset(offset);
    }
    let engine = SearchEngine::with_config(store.into_shared(), config);

    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Search(args) => {
            let cmd = SearchCommand::new(&engine);
            cmd.execute(&mut stdout, &format, &args)?;
        }
        Commands::Aggregate(args) => {
            let cmd = AggregateCommand::new(&engine);
            cmd.execute(&mut stdout, &format, &args)?;
        }
        Commands::Serve => {
            let cmd = ServeCommand::new(&engine);
            cmd.execute(io::stdin().lock(), &mut stdout)?;
        }
    }

    Ok(())
}

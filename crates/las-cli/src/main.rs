//! LAS CLI - Command-line interface for the Lucidtech AI Services API
//!
//! Thin wrapper over `las-core`: every command resolves credentials, makes
//! one or more API calls and prints the responses.

mod cli;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!(
                "{}",
                error::format_error(&e, control::SHOULD_COLORIZE.should_colorize())
            );

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli), fields(command = ?cli.command, session = logging::session_id().unwrap_or("unknown")))]
async fn run(cli: Cli) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let client = handlers::connect(&cli)?;
    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(verbosity = cli.verbosity_level(), "Executing command");

    match cli.command {
        Commands::Documents { command } => {
            handlers::handle_documents(command, &client, &mut output).await
        }
        Commands::Assets { command } => handlers::handle_assets(command, &client, &mut output).await,
        Commands::Predictions { command } => {
            handlers::handle_predictions(command, &client, &mut output).await
        }
        Commands::Heartbeat(args) => handlers::handle_heartbeat(args, &client, &mut output).await,
        Commands::Request(args) => handlers::handle_request(args, &client, &mut output).await,
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

mod cli;
mod commands;
mod formatting;

use std::process::ExitCode;

use cbx_lib::OutputMode;
use cli::Commands;
use commands::run_analysis;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Analyze(run) => run_analysis(OutputMode::Analyze, args.config, run).await,
        Commands::Tokens(run) => run_analysis(OutputMode::Tokens, args.config, run).await,
    }
}

/// Logs go to stderr; stdout carries only the report. `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

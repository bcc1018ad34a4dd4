use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{execute_command, Cli};
use company_warrior::exit_status;

fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    // Execute the appropriate command; the failing tool's exit code is ours
    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

// RUST_LOG, when set, takes precedence over --log-level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

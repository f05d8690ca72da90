//! TAC Writer installation orchestrator
//!
//! Detects the host's package family, lets the user pick between a
//! native package install and a portable AppImage bundle, and drives the
//! chosen pipeline while reporting progress through the dialog backend.

mod cli;
mod commands;
mod orchestrator;
mod output;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let code = match orchestrator::run(&cli).await {
        Ok(code) => code,
        Err(err) => {
            output::error(&format!("{err:#}"));
            1
        }
    };
    std::process::exit(code);
}

/// Initialize tracing with appropriate verbosity.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

//! CLI argument parsing with clap
//!
//! The orchestrator's branching is driven by host identity and dialog
//! choices, not by flags; only ambient options are parsed here.

use clap::Parser;

/// TAC Writer installation orchestrator
#[derive(Parser, Debug)]
#[command(name = "tac-setup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Keep the session directory and its logs for postmortem inspection
    #[arg(long, env = "TACSETUP_DEBUG")]
    pub debug: bool,
}

//! Top-level control flow
//!
//! SessionLifecycle owns the run: create the working directory, register
//! the interrupt guard, classify the host, ask the user which pipeline to
//! run, and guarantee sentinel release and cleanup on every exit path.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::warn;

use tacsetup_core::{HostEnvironment, Session};

use crate::cli::Cli;
use crate::commands;
use crate::output;

/// Run the orchestrator; returns the process exit code.
pub async fn run(cli: &Cli) -> Result<i32> {
    let host = HostEnvironment::detect();
    let session = Arc::new(Session::create(cli.debug).context("could not create session directory")?);
    install_signal_guard(Arc::clone(&session));

    let dialog = tacsetup_ui::detect_backend();

    output::info("TAC Writer installer");
    output::kv("host", &host.pretty_name);
    output::kv("family", &host.classify().to_string());
    output::kv("session", &session.dir().display().to_string());

    let choice = dialog.choose(
        "TAC Writer Installer",
        "How should TAC Writer be installed on this system?",
        &[
            "Install the native package for this distribution",
            "Build a portable AppImage bundle",
        ],
    );

    let code = match choice {
        Some(0) => commands::native::run(&host, &session, dialog.as_ref()).await?,
        Some(1) => commands::portable::run(&session, dialog.as_ref()).await?,
        _ => {
            output::info("No installation selected.");
            0
        }
    };

    // Signal-then-remove ordering: a still-pending job observes the
    // close-flag before its directory disappears.
    session.finish();
    if code == 0 {
        output::success("Finished.");
    }
    Ok(code)
}

/// Interrupt/termination guard: force the close-flag so no terminal job
/// is left polling forever, clean up, and exit. A privileged command
/// already dispatched through the elevation agent cannot be cancelled;
/// this only keeps the orchestrator from hanging.
fn install_signal_guard(session: Arc<Session>) {
    tokio::spawn(async move {
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(err) => {
                warn!(error = %err, "could not register SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
        warn!("interrupted; releasing pending job and cleaning up");
        session.force_release();
        session.cleanup();
        std::process::exit(130);
    });
}

//! Job runner
//!
//! Drives one external job through its whole lifecycle: flag hygiene,
//! script staging, terminal launch, the poll loop behind a pulsating
//! progress dialog, and outcome reporting. The close-flag is signaled
//! only after the done-flag was observed and the outcome shown.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use tacsetup_core::Session;
use tacsetup_ui::Dialog;

use crate::handle::{JobHandle, JobStatus};
use crate::script::JobSpec;
use crate::terminal::Terminal;

/// External-job failures of the runner itself (a job that ran and exited
/// nonzero is a [`JobStatus::Error`], not a `JobError`).
#[derive(Error, Debug)]
pub enum JobError {
    /// No terminal emulator on PATH
    #[error("no terminal emulator found (tried: {tried})")]
    NoTerminal {
        /// The candidate list that was probed
        tried: String,
    },

    /// Script staging failed
    #[error("could not stage job script: {0}")]
    Stage(#[source] std::io::Error),

    /// The terminal emulator did not launch
    #[error("terminal emulator {terminal} failed to launch: {source}")]
    Spawn {
        /// Emulator that was attempted
        terminal: String,
        /// Underlying spawn error
        source: std::io::Error,
    },
}

/// Runs [`JobSpec`]s against one session's sentinel slot.
pub struct JobRunner<'a> {
    session: &'a Session,
    dialog: &'a dyn Dialog,
    poll_interval: Duration,
}

impl<'a> JobRunner<'a> {
    pub fn new(session: &'a Session, dialog: &'a dyn Dialog) -> Self {
        Self {
            session,
            dialog,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Override the polling interval. Test hook.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Stage the script for `spec`: delete stale sentinel files from the
    /// slot, render the script and make it executable.
    ///
    /// Starting a new job implies the previous one has terminated; the
    /// delete-before-reuse discipline here is what makes the single
    /// sentinel slot safe to reuse.
    pub fn stage(&self, spec: &JobSpec) -> Result<PathBuf, JobError> {
        for stale in [
            self.session.done_flag(),
            self.session.close_flag(),
            self.session.success_flag(),
        ] {
            match fs::remove_file(&stale) {
                Ok(()) => debug!(flag = %stale.display(), "removed stale flag"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(JobError::Stage(err)),
            }
        }

        let path = self.session.script_path(spec.name);
        fs::write(&path, spec.render(self.session)).map_err(JobError::Stage)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).map_err(JobError::Stage)?;
        debug!(script = %path.display(), "job script staged");
        Ok(path)
    }

    /// Launch a staged script inside `terminal`, detached.
    pub fn launch(&self, terminal: Terminal, script: &Path) -> Result<(), JobError> {
        info!(%terminal, script = %script.display(), "launching terminal job");
        std::process::Command::new(terminal.command)
            .arg(terminal.exec_flag)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|source| JobError::Spawn {
                terminal: terminal.command.to_string(),
                source,
            })
    }

    /// Run `spec` to completion: stage, launch, synchronize, report.
    pub async fn run(&self, spec: &JobSpec) -> Result<JobStatus, JobError> {
        let terminal = Terminal::detect().ok_or_else(|| JobError::NoTerminal {
            tried: Terminal::candidates(),
        })?;

        let script = self.stage(spec)?;
        self.launch(terminal, &script)?;

        let handle = JobHandle::new(self.session).with_poll_interval(self.poll_interval);
        let mut progress = self.dialog.progress(&spec.title, true);
        let status = handle.await_status(progress.as_mut()).await;
        progress.finish();

        match status {
            JobStatus::Success => {
                // Release first: the terminal may close as soon as the
                // script exits, and there is nothing left to read there.
                handle.release();
                self.dialog.info(&spec.success_message);
            }
            JobStatus::Error | JobStatus::Pending => {
                // Report before releasing, then release anyway: the
                // subprocess must never be left blocked. The terminal
                // stays open only if the script itself pauses.
                self.dialog.error(&spec.error_message);
                handle.release();
            }
        }

        Ok(status)
    }
}

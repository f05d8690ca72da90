//! Sentinel-file handshake
//!
//! [`JobHandle`] encapsulates the orchestrator side of the done/close
//! protocol: poll for the done-flag at a fixed interval, then signal the
//! close-flag. The polling interval and the flag paths are details of
//! this type, not of the callers.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tacsetup_core::Session;
use tacsetup_ui::Progress;

/// Outcome of an external job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Job has not reported yet
    Pending,
    /// Wrapped script exited 0
    Success,
    /// Wrapped script exited nonzero
    Error,
}

/// Orchestrator-side handle on a running external job.
#[derive(Debug)]
pub struct JobHandle {
    done_flag: PathBuf,
    close_flag: PathBuf,
    poll_interval: Duration,
}

impl JobHandle {
    /// Handle over the session's sentinel slot.
    pub fn new(session: &Session) -> Self {
        Self {
            done_flag: session.done_flag(),
            close_flag: session.close_flag(),
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Override the polling interval. Test hook.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Poll until the done-flag appears and carries a status.
    ///
    /// Never signals the close-flag; that is [`release`](Self::release),
    /// called only after the outcome has been reported. The loop has no
    /// timeout: a privileged install may legitimately take minutes, and
    /// cancellation arrives via the session's force-release path.
    pub async fn await_status(&self, progress: &mut dyn Progress) -> JobStatus {
        loop {
            match self.peek() {
                JobStatus::Pending => {
                    progress.message("Processing: waiting for the terminal job to finish…");
                    tokio::time::sleep(self.poll_interval).await;
                }
                status => {
                    tracing::debug!(?status, "done-flag observed");
                    return status;
                }
            }
        }
    }

    /// Non-blocking read of the done-flag.
    pub fn peek(&self) -> JobStatus {
        match fs::read_to_string(&self.done_flag) {
            Ok(content) => match content.trim() {
                // An existing but still-empty flag means the subprocess is
                // mid-write; treat it as not reported yet.
                "" => JobStatus::Pending,
                "success" => JobStatus::Success,
                _ => JobStatus::Error,
            },
            Err(_) => JobStatus::Pending,
        }
    }

    /// Signal the close-flag, releasing the waiting subprocess.
    pub fn release(&self) {
        if let Err(err) = fs::write(&self.close_flag, b"closed\n") {
            tracing::warn!(error = %err, "could not signal close-flag");
        }
    }
}

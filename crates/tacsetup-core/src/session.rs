//! Session lifecycle
//!
//! A session owns one temporary working directory holding every transient
//! file of a run: the downloaded artifact, diagnostic logs, generated job
//! scripts and the sentinel flag pair. The directory is removed on exit
//! unless debug retention is on, and the close-flag is always signaled
//! before removal so no external job is left polling a path that is about
//! to disappear.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the done-flag sentinel (written by the job subprocess).
const DONE_FLAG: &str = "job.done";

/// Name of the close-flag sentinel (written by the orchestrator).
const CLOSE_FLAG: &str = "job.close";

/// Name of the success marker some job scripts leave behind.
const SUCCESS_FLAG: &str = "job.success";

/// A session-scoped temporary working directory.
#[derive(Debug)]
pub struct Session {
    dir: PathBuf,
    debug: bool,
}

impl Session {
    /// Create the per-run working directory under the system temp root.
    pub fn create(debug: bool) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("tac-setup-")
            .tempdir()?
            // Lifecycle is managed explicitly below; see cleanup().
            .keep();
        let debug_flag = debug;
        tracing::debug!(dir = %dir.display(), debug = debug_flag, "session directory created");
        Ok(Self { dir, debug })
    }

    /// Use an existing directory as the session root. Test hook.
    pub fn at(dir: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            dir: dir.into(),
            debug,
        }
    }

    /// Session working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the directory is retained for postmortem inspection.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Done-flag path: written by the job subprocess when its script ends.
    pub fn done_flag(&self) -> PathBuf {
        self.dir.join(DONE_FLAG)
    }

    /// Close-flag path: written by the orchestrator, never the subprocess.
    pub fn close_flag(&self) -> PathBuf {
        self.dir.join(CLOSE_FLAG)
    }

    /// Success-marker path, left by scripts whose outcome is checked
    /// beyond the exit code.
    pub fn success_flag(&self) -> PathBuf {
        self.dir.join(SUCCESS_FLAG)
    }

    /// Path for a generated job script.
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Destination path for a downloaded artifact.
    pub fn download_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Transfer log written by the downloader.
    pub fn transfer_log(&self) -> PathBuf {
        self.dir.join("transfer.log")
    }

    /// Combined package-manager output log.
    pub fn install_log(&self) -> PathBuf {
        self.dir.join("install.log")
    }

    /// Portable-bundle build log.
    pub fn build_log(&self) -> PathBuf {
        self.dir.join("build.log")
    }

    /// Staging tree for the portable-bundle pipeline.
    pub fn appdir(&self) -> PathBuf {
        self.dir.join("AppDir")
    }

    /// Force the close-flag, unblocking any subprocess waiting on it.
    ///
    /// Safe to call at any time: a job that already consumed its flags is
    /// unaffected, and a run with no job simply gains a stray file that is
    /// removed with the directory. Called from signal handlers, so errors
    /// are swallowed rather than propagated.
    pub fn force_release(&self) {
        if let Err(err) = fs::write(self.close_flag(), b"closed\n") {
            tracing::warn!(error = %err, "could not signal close-flag");
        }
    }

    /// Remove the working directory, unless debug retention is on.
    pub fn cleanup(&self) {
        if self.debug {
            tracing::info!(dir = %self.dir.display(), "debug mode: session directory retained");
            return;
        }
        if let Err(err) = fs::remove_dir_all(&self.dir) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!(error = %err, dir = %self.dir.display(), "session cleanup failed");
            }
        }
    }

    /// Signal the close-flag, then clean up. The ordering matters: a
    /// still-pending job must observe the flag before its directory goes
    /// away.
    pub fn finish(&self) {
        self.force_release();
        self.cleanup();
    }
}

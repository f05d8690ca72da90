//! Streaming artifact download with progress relay
//!
//! The transfer is streamed chunk by chunk; integer percentage steps are
//! relayed to the progress window together with rate and ETA, and every
//! step is appended to a transfer log kept next to the artifact. The exit
//! status of the transfer alone is not trusted: a destination file that is
//! missing or empty after the transfer is always a failure, which guards
//! against servers answering 200 with an empty body.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::StreamExt;
use thiserror::Error;
use tracing::{debug, info};

use tacsetup_ui::Progress;

/// Download failure conditions.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport-level failure
    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("download failed with HTTP status {status}")]
    Status {
        /// The HTTP status received
        status: reqwest::StatusCode,
    },

    /// Destination file missing after the transfer
    #[error("artifact missing after transfer: {path}")]
    MissingArtifact {
        /// Expected artifact path
        path: PathBuf,
    },

    /// Destination file present but zero-length
    #[error("artifact is empty after transfer: {path}")]
    EmptyArtifact {
        /// Empty artifact path
        path: PathBuf,
    },

    /// Local write failure
    #[error("transfer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Streaming downloader with transfer-log diagnostics.
pub struct Downloader {
    client: reqwest::Client,
    transfer_log: Option<PathBuf>,
}

impl Downloader {
    /// Create a downloader.
    pub fn new() -> Result<Self, DownloadError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("TAC-Writer-Installer/", env!("CARGO_PKG_VERSION")))
                .connect_timeout(std::time::Duration::from_secs(15))
                .build()?,
            transfer_log: None,
        })
    }

    /// Append transfer diagnostics to `path`.
    pub fn with_transfer_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.transfer_log = Some(path.into());
        self
    }

    /// Fetch `url` into `dest`, relaying progress events terminating at
    /// 100 on success.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn Progress,
    ) -> Result<(), DownloadError> {
        info!(%url, dest = %dest.display(), "starting download");
        self.log(&format!("GET {url}"));

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            self.log(&format!("failed: HTTP {status}"));
            return Err(DownloadError::Status { status });
        }

        let total = response.content_length().unwrap_or(0);
        let mut file = File::create(dest)?;
        let mut downloaded: u64 = 0;
        let mut last_percent: u8 = 0;
        let started = Instant::now();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;

            if total > 0 {
                let percent = ((downloaded * 100) / total).min(100) as u8;
                if percent > last_percent {
                    last_percent = percent;
                    let line = transfer_line(percent, downloaded, total, started.elapsed());
                    progress.set(percent, &line);
                    self.log(&line);
                }
            } else {
                progress.message(&format!("Downloading… {} received", human_size(downloaded)));
            }
        }
        file.flush()?;
        drop(file);

        // The transfer tool's own verdict is not enough: verify the bytes
        // actually landed.
        let metadata = fs::metadata(dest).map_err(|_| DownloadError::MissingArtifact {
            path: dest.to_path_buf(),
        })?;
        if metadata.len() == 0 {
            self.log("failed: empty artifact");
            return Err(DownloadError::EmptyArtifact {
                path: dest.to_path_buf(),
            });
        }

        progress.set(100, "Download complete");
        self.log(&format!("done: {} bytes", metadata.len()));
        debug!(bytes = metadata.len(), "download verified");
        Ok(())
    }

    fn log(&self, message: &str) {
        let Some(path) = &self.transfer_log else {
            return;
        };
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut log| writeln!(log, "[{stamp}] {message}"));
        if let Err(err) = result {
            tracing::warn!(error = %err, "could not write transfer log");
        }
    }
}

/// One progress line: percent, sizes, rate and ETA.
fn transfer_line(percent: u8, downloaded: u64, total: u64, elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs_f64().max(0.001);
    let rate = downloaded as f64 / secs;
    let remaining = total.saturating_sub(downloaded);
    let eta = if rate > 0.0 {
        (remaining as f64 / rate).ceil() as u64
    } else {
        0
    };
    format!(
        "Downloading… {percent}% of {} ({}/s, ETA {eta}s)",
        human_size(total),
        human_size(rate as u64),
    )
}

/// Convert bytes to a human-readable size.
fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

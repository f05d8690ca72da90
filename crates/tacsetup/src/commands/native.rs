//! Native package installation pipeline
//!
//! Resolve the family's release artifact, download it, hand it to the
//! package manager under elevation, and fall back to the repair job when
//! the zypper family rejects the declarative install. Every terminal
//! failure surfaces a dialog; the only automatic retry is that single
//! family-specific repair pass.

use anyhow::Result;
use tracing::{info, warn};

use tacsetup_core::{HostEnvironment, PackageFamily, ReleaseArtifact, Session};
use tacsetup_fetch::{Downloader, ReleaseClient};
use tacsetup_install::supervisor::record_installed_version;
use tacsetup_install::{aur_spec, find_aur_helper, install_native, repair_spec, runtime_manifest};
use tacsetup_install::InstallError;
use tacsetup_jobs::{JobRunner, JobStatus};
use tacsetup_ui::Dialog;

/// Run the native pipeline; returns the process exit code.
pub async fn run(host: &HostEnvironment, session: &Session, dialog: &dyn Dialog) -> Result<i32> {
    let family = match host.classify_native() {
        Ok(family) => family,
        Err(err) => {
            // Fatal, no retry: the user is told and the run ends.
            dialog.error(&format!(
                "This distribution is not supported for a native install.\n\n{err}\n\n\
                 The portable AppImage bundle may still work."
            ));
            return Ok(1);
        }
    };

    if family == PackageFamily::ArchAur {
        return run_aur(session, dialog).await;
    }

    let release = match ReleaseClient::new()?.latest().await {
        Ok(release) => release,
        Err(err) => {
            dialog.error(&format!(
                "Could not look up the latest TAC Writer release.\n\n{err}"
            ));
            return Ok(1);
        }
    };
    let version = release.version().to_string();
    info!(%version, %family, "resolved release");

    let Some(mut artifact) = ReleaseArtifact::resolve(host, family, &version)? else {
        // Unreachable for the families that get here; resolve() only
        // returns None for the AUR family.
        return Ok(1);
    };

    let dest = session.download_path(&artifact.filename);
    let mut progress = dialog.progress("Downloading TAC Writer", false);
    let downloaded = Downloader::new()?
        .with_transfer_log(session.transfer_log())
        .fetch(&artifact.download_url, &dest, progress.as_mut())
        .await;
    progress.finish();

    if let Err(err) = downloaded {
        dialog.error(&format!("The download failed.\n\n{err}"));
        if dialog.question(
            "Download failed",
            "View the transfer log?",
            "View log",
            "Close",
        ) {
            dialog.text_view(&session.transfer_log(), "Transfer log");
        }
        return Ok(1);
    }
    artifact.mark_downloaded(dest);

    match install_native(&artifact, session).await {
        Ok(()) => {
            if let Err(err) = record_installed_version(&version) {
                warn!(error = %err, "could not record installed version");
            }
            dialog.info(&format!("TAC Writer {version} was installed."));
            Ok(0)
        }
        Err(InstallError::Failed { code, log }) if family == PackageFamily::RpmZypper => {
            // The zypper family gets the one automated fallback.
            let repair = dialog.question(
                "Installation failed",
                "The package manager rejected the install. This usually means missing \
                 dependencies on this distribution.\n\nAttempt an automated dependency repair?",
                "Attempt repair",
                "View log",
            );
            if !repair {
                dialog.text_view(&log, "Install log");
                return Ok(code);
            }
            run_repair(&artifact, session, dialog).await
        }
        Err(InstallError::Failed { code, log }) => {
            dialog.error("The package manager reported an error during installation.");
            if dialog.question(
                "Installation failed",
                "View the install log?",
                "View log",
                "Close",
            ) {
                dialog.text_view(&log, "Install log");
            }
            Ok(code)
        }
        Err(err) => {
            dialog.error(&format!("The installation could not be started.\n\n{err}"));
            Ok(1)
        }
    }
}

/// Repair fallback: one external job, no re-attempt on failure.
async fn run_repair(
    artifact: &ReleaseArtifact,
    session: &Session,
    dialog: &dyn Dialog,
) -> Result<i32> {
    let manifest = runtime_manifest();
    let spec = repair_spec(artifact, &manifest);

    match JobRunner::new(session, dialog).run(&spec).await {
        Ok(JobStatus::Success) => Ok(0),
        Ok(_) => Ok(1),
        Err(err) => {
            dialog.error(&format!("The repair job could not be run.\n\n{err}"));
            Ok(1)
        }
    }
}

/// Arch-family install: delegated entirely to an AUR-helper job.
async fn run_aur(session: &Session, dialog: &dyn Dialog) -> Result<i32> {
    let Some(helper) = find_aur_helper() else {
        dialog.error(
            "No AUR helper was found. Install yay or paru, or build the tac-writer \
             package manually from the AUR.",
        );
        return Ok(1);
    };

    let spec = aur_spec(helper, session);
    match JobRunner::new(session, dialog).run(&spec).await {
        Ok(JobStatus::Success) => {
            if !session.success_flag().is_file() {
                warn!("AUR job exited 0 without leaving its success marker");
            }
            // Success flag observed: nothing further to do.
            Ok(0)
        }
        Ok(_) => Ok(1),
        Err(err) => {
            dialog.error(&format!("The AUR job could not be run.\n\n{err}"));
            Ok(1)
        }
    }
}

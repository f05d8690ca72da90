//! Install supervisor
//!
//! The primary privileged install attempt. This step is headless: the
//! package manager runs under `pkexec`, so the privilege prompt is the
//! desktop's own elevation agent, not a terminal. Combined output is
//! captured to the install log; exit code 0 is the only success signal.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use tacsetup_core::{utils, PackageFamily, ReleaseArtifact, Session};

/// Native-install failure conditions.
#[derive(Error, Debug)]
pub enum InstallError {
    /// Family has no headless package-manager path
    #[error("family {family} has no native package-manager install")]
    Unsupported {
        /// The family that was requested
        family: PackageFamily,
    },

    /// Artifact was never downloaded
    #[error("artifact {filename} has no local path; download it first")]
    MissingArtifact {
        /// Artifact filename
        filename: String,
    },

    /// Package manager exited nonzero
    #[error("package manager exited with code {code}; log at {log}")]
    Failed {
        /// Exit code (or -1 when killed by a signal)
        code: i32,
        /// Combined-output log path
        log: PathBuf,
    },

    /// The package manager could not be run at all
    #[error("could not run the package manager: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the privileged install command line for a family.
///
/// `None` for families without a headless install path (Arch delegates
/// to an AUR-helper job, Unknown is fatal upstream).
pub fn install_command(family: PackageFamily, artifact_path: &str) -> Option<Vec<String>> {
    let argv: Vec<&str> = match family {
        PackageFamily::DebianApt => vec!["pkexec", "apt-get", "install", "-y", artifact_path],
        PackageFamily::RpmDnf => vec!["pkexec", "dnf", "install", "-y", artifact_path],
        PackageFamily::RpmZypper => vec![
            "pkexec",
            "zypper",
            "--non-interactive",
            "--no-gpg-checks",
            "install",
            "--allow-unsigned-rpm",
            artifact_path,
        ],
        PackageFamily::ArchAur | PackageFamily::Unknown => return None,
    };
    Some(argv.into_iter().map(String::from).collect())
}

/// Run the family's package manager against the downloaded artifact.
pub async fn install_native(
    artifact: &ReleaseArtifact,
    session: &Session,
) -> Result<(), InstallError> {
    let local_path = artifact
        .local_path()
        .ok_or_else(|| InstallError::MissingArtifact {
            filename: artifact.filename.clone(),
        })?;
    let argv = install_command(artifact.family, &local_path.display().to_string()).ok_or(
        InstallError::Unsupported {
            family: artifact.family,
        },
    )?;

    info!(family = %artifact.family, command = ?argv, "running native install");

    let log = session.install_log();
    let expression = duct::cmd(&argv[0], &argv[1..])
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked();
    let output = tokio::task::spawn_blocking(move || expression.run())
        .await
        .expect("install task must not panic")?;

    fs::write(&log, &output.stdout)?;

    if output.status.success() {
        info!("native install succeeded");
        Ok(())
    } else {
        let code = output.status.code().unwrap_or(-1);
        warn!(code, log = %log.display(), "native install failed");
        Err(InstallError::Failed { code, log })
    }
}

/// Record the installed version where the application's update checker
/// looks for it (`~/.local/share/tac-writer/version.txt`).
pub fn record_installed_version(version: &str) -> std::io::Result<()> {
    let Some(dir) = utils::app_data_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("version.txt"), format!("{version}\n"))
}

//! Portable-bundle builder
//!
//! Stages, each fatal on failure with its own log line: download the
//! release package, unpack its data payload into an AppDir, locate the
//! desktop metadata and icon, retarget the launcher, synthesize the
//! `AppRun` entry point, pack with `appimagetool`, verify the output and
//! move it to the user's downloads directory. The packaging tool's exit
//! code alone is not trusted: a missing or empty output is a failure.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use tacsetup_core::{utils, ReleaseArtifact, Session};
use tacsetup_fetch::{DownloadError, Downloader};
use tacsetup_ui::{Dialog, Progress};

use crate::desktop::{self, DesktopEntry, PLACEHOLDER_ICON_SVG};
use crate::payload::{self, PayloadError};

/// Portable-pipeline failures, tagged by stage.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Download stage
    #[error("download stage failed: {0}")]
    Download(#[from] DownloadError),

    /// Payload-extraction stage
    #[error("extract stage failed: {0}")]
    Extract(#[from] PayloadError),

    /// Metadata-discovery stage
    #[error("metadata stage failed: {message}")]
    Metadata {
        /// What was missing or malformed
        message: String,
    },

    /// Launcher-retargeting stage
    #[error("launcher stage failed: {0}")]
    Launcher(#[source] std::io::Error),

    /// Entry-point synthesis stage
    #[error("entry-point stage failed: {0}")]
    EntryPoint(#[source] std::io::Error),

    /// Packaging-tool stage
    #[error("pack stage failed: {message}")]
    Pack {
        /// Tool failure description
        message: String,
    },

    /// Output verification stage
    #[error("verify stage failed: output {path} is missing or empty")]
    Verify {
        /// Declared output path
        path: PathBuf,
    },

    /// Delivery to the downloads directory
    #[error("deliver stage failed: {0}")]
    Deliver(#[source] std::io::Error),

    /// Staging I/O outside a named stage
    #[error("build I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Paths of one build run. `output_path` is only meaningful after
/// [`verify_output`] accepted it.
#[derive(Debug)]
pub struct BuildContext {
    /// AppDir staging tree
    pub staging_dir: PathBuf,
    /// Parsed desktop metadata
    pub entry: DesktopEntry,
    /// Icon placed at the AppDir root
    pub icon_path: PathBuf,
    /// Rewritten launcher inside the staging tree
    pub launcher_path: PathBuf,
    /// Synthesized `AppRun`
    pub entry_point_path: PathBuf,
    /// Declared packaging-tool output
    pub output_path: PathBuf,
}

/// Builds a relocatable AppImage from the release `.deb`.
pub struct BundleBuilder<'a> {
    session: &'a Session,
    dialog: &'a dyn Dialog,
    output_dir: Option<PathBuf>,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(session: &'a Session, dialog: &'a dyn Dialog) -> Self {
        Self {
            session,
            dialog,
            output_dir: None,
        }
    }

    /// Deliver into `dir` instead of the user's downloads directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Run the whole pipeline for a release version. Returns the final
    /// bundle location.
    pub async fn build_portable(&self, version: &str) -> Result<PathBuf, BuildError> {
        let mut progress = self.dialog.progress("Building portable bundle", true);
        let result = self.pipeline(version, progress.as_mut()).await;
        progress.finish();

        match &result {
            Ok(path) => {
                self.log(&format!("bundle ready: {}", path.display()));
                info!(path = %path.display(), "portable bundle built");
            }
            Err(err) => self.log(&format!("build failed: {err}")),
        }
        result
    }

    async fn pipeline(
        &self,
        version: &str,
        progress: &mut dyn Progress,
    ) -> Result<PathBuf, BuildError> {
        // Download the distribution-neutral payload package.
        self.log("stage: download");
        progress.message("Downloading the release package…");
        let artifact = ReleaseArtifact::portable_payload(version);
        let package_path = self.session.download_path(&artifact.filename);
        Downloader::new()?
            .with_transfer_log(self.session.transfer_log())
            .fetch(&artifact.download_url, &package_path, progress)
            .await?;

        let package = fs::read(&package_path)?;
        progress.message("Assembling the application tree…");
        let context = self.assemble(&package, version)?;

        self.log("stage: pack");
        progress.message("Packing the AppImage…");
        self.pack(&context).await?;

        self.log("stage: verify");
        verify_output(&context.output_path)?;

        self.log("stage: deliver");
        progress.message("Moving the bundle to your downloads…");
        let delivered = self.deliver(&context)?;
        progress.set(100, "Bundle ready");
        Ok(delivered)
    }

    /// Unpack the package and stage a complete AppDir: payload tree,
    /// root-level desktop metadata and icon, retargeted launcher and
    /// synthesized `AppRun`.
    pub fn assemble(&self, package: &[u8], version: &str) -> Result<BuildContext, BuildError> {
        let staging_dir = self.session.appdir();
        fs::create_dir_all(&staging_dir)?;

        self.log("stage: extract");
        let codec = payload::extract_data_tar(package, &staging_dir)?;
        self.log(&format!("payload codec: {codec:?}"));

        self.log("stage: metadata");
        let desktop_file =
            desktop::find_desktop_file(&staging_dir).ok_or_else(|| BuildError::Metadata {
                message: "no desktop entry in package payload".to_string(),
            })?;
        let entry = desktop::parse_desktop_entry(&fs::read_to_string(&desktop_file)?).ok_or_else(
            || BuildError::Metadata {
                message: format!("desktop entry {} has no Exec line", desktop_file.display()),
            },
        )?;
        fs::copy(
            &desktop_file,
            staging_dir.join(desktop_file.file_name().expect("desktop file name")),
        )?;

        let icon_name = entry.icon.clone().unwrap_or_else(|| entry.exec.clone());
        let icon_path = match desktop::find_icon(&staging_dir, &icon_name) {
            Some(found) => {
                let ext = found.extension().and_then(|ext| ext.to_str()).unwrap_or("png");
                let target = staging_dir.join(format!("{icon_name}.{ext}"));
                fs::copy(&found, &target)?;
                target
            }
            None => {
                // Tolerated: fall back to a synthesized placeholder.
                self.log("icon missing, writing placeholder");
                let target = staging_dir.join(format!("{icon_name}.svg"));
                fs::write(&target, PLACEHOLDER_ICON_SVG)?;
                target
            }
        };

        self.log("stage: launcher");
        let launcher_path = staging_dir.join("usr/bin").join(&entry.exec);
        write_launcher(&launcher_path).map_err(BuildError::Launcher)?;

        self.log("stage: entry-point");
        let entry_point_path = staging_dir.join("AppRun");
        write_apprun(&entry_point_path, &entry.exec).map_err(BuildError::EntryPoint)?;

        let output_path = self
            .session
            .dir()
            .join(format!("TAC_Writer-{version}-x86_64.AppImage"));

        Ok(BuildContext {
            staging_dir,
            entry,
            icon_path,
            launcher_path,
            entry_point_path,
            output_path,
        })
    }

    /// Invoke the external packaging tool over the staged tree.
    async fn pack(&self, context: &BuildContext) -> Result<(), BuildError> {
        if which::which("appimagetool").is_err() {
            return Err(BuildError::Pack {
                message: "appimagetool is not installed".to_string(),
            });
        }

        let expression = duct::cmd(
            "appimagetool",
            [&context.staging_dir, &context.output_path],
        )
        .env("ARCH", "x86_64")
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked();

        let output = tokio::task::spawn_blocking(move || expression.run())
            .await
            .expect("pack task must not panic")?;

        let log = self.session.build_log();
        let mut file = OpenOptions::new().create(true).append(true).open(&log)?;
        file.write_all(&output.stdout)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(BuildError::Pack {
                message: format!(
                    "appimagetool exited with code {}; log at {}",
                    output.status.code().unwrap_or(-1),
                    log.display()
                ),
            })
        }
    }

    /// Move the verified output to its final location.
    fn deliver(&self, context: &BuildContext) -> Result<PathBuf, BuildError> {
        let target_dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => utils::downloads_dir().ok_or_else(|| {
                BuildError::Deliver(std::io::Error::other("no downloads directory"))
            })?,
        };
        fs::create_dir_all(&target_dir).map_err(BuildError::Deliver)?;

        let target = target_dir.join(
            context
                .output_path
                .file_name()
                .expect("output has a file name"),
        );
        move_file(&context.output_path, &target).map_err(BuildError::Deliver)?;
        Ok(target)
    }

    fn log(&self, message: &str) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.session.build_log())
            .and_then(|mut log| writeln!(log, "[{stamp}] {message}"));
        if let Err(err) = result {
            tracing::warn!(error = %err, "could not write build log");
        }
    }
}

/// The declared output is only valid if it exists and is non-empty, even
/// when the packaging tool reported success.
pub fn verify_output(path: &Path) -> Result<(), BuildError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.len() > 0 => Ok(()),
        _ => Err(BuildError::Verify {
            path: path.to_path_buf(),
        }),
    }
}

/// Rewrite the launcher so it resolves the runtime relative to its own
/// location, keeping the bundle relocatable.
fn write_launcher(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let script = "#!/usr/bin/env bash\n\
                  HERE=\"$(dirname \"$(readlink -f \"$0\")\")\"\n\
                  exec python3 \"$HERE/../share/tac-writer/main.py\" \"$@\"\n";
    fs::write(path, script)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

/// Synthesize the root entry point: export search paths relative to the
/// entry point itself and dispatch to the desktop entry's binary.
fn write_apprun(path: &Path, exec: &str) -> std::io::Result<()> {
    let script = format!(
        "#!/usr/bin/env bash\n\
         HERE=\"$(dirname \"$(readlink -f \"$0\")\")\"\n\
         export PATH=\"$HERE/usr/bin:$PATH\"\n\
         export LD_LIBRARY_PATH=\"$HERE/usr/lib:${{LD_LIBRARY_PATH:-}}\"\n\
         export PYTHONPATH=\"$HERE/usr/share/tac-writer:${{PYTHONPATH:-}}\"\n\
         exec \"$HERE/usr/bin/{exec}\" \"$@\"\n"
    );
    fs::write(path, script)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

/// Rename, falling back to copy-and-remove across filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) => {
            debug!(error = %err, "rename failed, copying instead");
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tacsetup_ui::dialog::RecordingDialog;

    const DESKTOP: &str = "\
[Desktop Entry]
Type=Application
Name=TAC Writer
Exec=tac-writer %u
Icon=tac-writer
";

    fn tar_with(files: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn fixture_deb(with_icon: bool) -> Vec<u8> {
        let mut files: Vec<(&str, &[u8], u32)> = vec![
            (
                "usr/bin/tac-writer",
                b"#!/bin/sh\nexec python3 /usr/share/tac-writer/main.py\n",
                0o755,
            ),
            ("usr/share/tac-writer/main.py", b"print('tac')\n", 0o644),
            (
                "usr/share/applications/tac-writer.desktop",
                DESKTOP.as_bytes(),
                0o644,
            ),
        ];
        if with_icon {
            files.push((
                "usr/share/icons/hicolor/128x128/apps/tac-writer.png",
                b"\x89PNG fake",
                0o644,
            ));
        }
        let data_tar = gzip(&tar_with(&files));
        crate::ar::write_entries(&[("debian-binary", b"2.0\n"), ("data.tar.gz", &data_tar)])
    }

    #[test]
    fn test_assemble_stages_a_complete_appdir() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::at(tmp.path(), false);
        let dialog = RecordingDialog::new(true, None);
        let builder = BundleBuilder::new(&session, &dialog);

        let context = builder.assemble(&fixture_deb(true), "26.02.15").unwrap();

        assert_eq!(context.entry.exec, "tac-writer");
        assert!(context.staging_dir.join("tac-writer.desktop").is_file());
        assert!(context.icon_path.ends_with("tac-writer.png"));
        assert!(context.icon_path.is_file());
        assert!(context
            .output_path
            .ends_with("TAC_Writer-26.02.15-x86_64.AppImage"));

        // Entry point and launcher are executable.
        for path in [&context.entry_point_path, &context.launcher_path] {
            let mode = fs::metadata(path).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0, "{} must be executable", path.display());
        }
    }

    #[test]
    fn test_assemble_rewrites_launcher_relative_to_itself() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::at(tmp.path(), false);
        let dialog = RecordingDialog::new(true, None);
        let builder = BundleBuilder::new(&session, &dialog);

        let context = builder.assemble(&fixture_deb(true), "26.02.15").unwrap();
        let launcher = fs::read_to_string(&context.launcher_path).unwrap();

        assert!(launcher.contains("readlink -f"));
        assert!(launcher.contains("$HERE/../share/tac-writer/main.py"));
        assert!(!launcher.contains("exec python3 /usr/share"));
    }

    #[test]
    fn test_assemble_entry_point_exports_relative_search_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::at(tmp.path(), false);
        let dialog = RecordingDialog::new(true, None);
        let builder = BundleBuilder::new(&session, &dialog);

        let context = builder.assemble(&fixture_deb(true), "26.02.15").unwrap();
        let apprun = fs::read_to_string(&context.entry_point_path).unwrap();

        assert!(apprun.contains("readlink -f"));
        assert!(apprun.contains("export LD_LIBRARY_PATH=\"$HERE/usr/lib"));
        assert!(apprun.contains("export PYTHONPATH=\"$HERE/usr/share/tac-writer"));
        assert!(apprun.contains("exec \"$HERE/usr/bin/tac-writer\""));
    }

    #[test]
    fn test_assemble_writes_placeholder_icon_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::at(tmp.path(), false);
        let dialog = RecordingDialog::new(true, None);
        let builder = BundleBuilder::new(&session, &dialog);

        let context = builder.assemble(&fixture_deb(false), "26.02.15").unwrap();
        assert!(context.icon_path.ends_with("tac-writer.svg"));
        let content = fs::read_to_string(&context.icon_path).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_assemble_without_desktop_entry_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::at(tmp.path(), false);
        let dialog = RecordingDialog::new(true, None);
        let builder = BundleBuilder::new(&session, &dialog);

        let data_tar = gzip(&tar_with(&[("usr/bin/tac-writer", b"#!/bin/sh\n", 0o755)]));
        let package =
            crate::ar::write_entries(&[("debian-binary", b"2.0\n"), ("data.tar.gz", &data_tar)]);

        let err = builder.assemble(&package, "26.02.15").unwrap_err();
        assert!(matches!(err, BuildError::Metadata { .. }));
    }

    #[test]
    fn test_verify_output_rejects_missing_and_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.AppImage");
        assert!(matches!(
            verify_output(&missing),
            Err(BuildError::Verify { .. })
        ));

        let empty = tmp.path().join("empty.AppImage");
        fs::write(&empty, b"").unwrap();
        assert!(matches!(
            verify_output(&empty),
            Err(BuildError::Verify { .. })
        ));

        let good = tmp.path().join("good.AppImage");
        fs::write(&good, b"ELF...").unwrap();
        assert!(verify_output(&good).is_ok());
    }

    #[test]
    fn test_move_file_within_filesystem() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("bundle.AppImage");
        let to = tmp.path().join("out/bundle.AppImage");
        fs::write(&from, b"bytes").unwrap();
        fs::create_dir_all(to.parent().unwrap()).unwrap();

        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"bytes");
    }
}

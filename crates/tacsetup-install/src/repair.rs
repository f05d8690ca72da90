//! Zypper repair workflow
//!
//! Fallback after a failed declarative install on the SUSE family, whose
//! package metadata is the least consistent across sibling distributions.
//! One external job refreshes the repositories, force-installs a fixed
//! dependency manifest and force-installs the artifact with dependency
//! resolution and signature checks disabled. This is the only path that
//! turns safety checks off, and it is opt-in behind a dialog choice.

use std::process::Command;

use tracing::debug;

use tacsetup_core::ReleaseArtifact;
use tacsetup_jobs::script::sh_quote;
use tacsetup_jobs::JobSpec;

/// Script filename for the repair job.
pub const REPAIR_JOB: &str = "zypper-repair.sh";

/// Runtime dependencies when the host names its Python packages with a
/// version suffix (`python311-gobject` style).
fn versioned_deps(minor: u32) -> Vec<String> {
    vec![
        format!("python3{minor}-gobject"),
        format!("python3{minor}-gobject-Gdk"),
        format!("python3{minor}-cairo"),
    ]
}

/// Runtime dependencies when the host uses generic package names.
const GENERIC_DEPS: &[&str] = &["python3-gobject", "python3-gobject-Gdk", "python3-cairo"];

/// Dependencies shared by both manifests.
const COMMON_DEPS: &[&str] = &[
    "typelib-1_0-Gtk-3_0",
    "typelib-1_0-GdkPixbuf-2_0",
    "typelib-1_0-Pango-1_0",
];

/// The dependency manifest for a host: versioned when a Python minor is
/// known to carry versioned package names, generic otherwise. The two
/// are mutually exclusive.
pub fn manifest_for(versioned_minor: Option<u32>) -> Vec<String> {
    let mut deps = match versioned_minor {
        Some(minor) => versioned_deps(minor),
        None => GENERIC_DEPS.iter().map(|dep| dep.to_string()).collect(),
    };
    deps.extend(COMMON_DEPS.iter().map(|dep| dep.to_string()));
    deps
}

/// Probe the host for a versioned Python runtime package name and build
/// the matching manifest.
pub fn runtime_manifest() -> Vec<String> {
    manifest_for(detect_versioned_runtime())
}

/// Python minor version, when the host both runs it and packages it
/// under a versioned name (`rpm -q python3XX-base` resolves).
fn detect_versioned_runtime() -> Option<u32> {
    let minor = python_minor()?;
    let package = format!("python3{minor}-base");
    let versioned = Command::new("rpm")
        .args(["-q", &package])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false);
    debug!(minor, versioned, "probed runtime package naming");
    versioned.then_some(minor)
}

fn python_minor() -> Option<u32> {
    let output = Command::new("python3")
        .args(["-c", "import sys; print(sys.version_info.minor)"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}

/// Build the repair job for a downloaded artifact.
///
/// The script pauses on a read prompt before its close-flag wait, so the
/// terminal stays readable until the user acknowledges the output.
pub fn repair_spec(artifact: &ReleaseArtifact, manifest: &[String]) -> JobSpec {
    let artifact_path = artifact
        .local_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| artifact.filename.clone());

    let body = format!(
        "set -e\n\
         echo 'Refreshing package repositories...'\n\
         zypper --non-interactive refresh\n\
         echo 'Installing runtime dependencies...'\n\
         zypper --non-interactive install --force {deps}\n\
         echo 'Force-installing {filename}...'\n\
         rpm -Uvh --nodeps --force {path}\n\
         echo 'Repair finished.'",
        deps = manifest
            .iter()
            .map(|dep| sh_quote(dep))
            .collect::<Vec<_>>()
            .join(" "),
        filename = artifact.filename,
        path = sh_quote(&artifact_path),
    );

    JobSpec {
        name: REPAIR_JOB,
        title: "Repairing installation".to_string(),
        body,
        pause_before_exit: true,
        success_message: "TAC Writer was installed after dependency repair.".to_string(),
        error_message:
            "The repair attempt failed. Check the terminal output for the failing step."
                .to_string(),
    }
}

//! Release-artifact resolution
//!
//! Filenames and download URLs are built from fixed per-family templates.
//! The Arch family resolves to no artifact at all: its install path is an
//! AUR-helper job building from the source recipe, so there is nothing to
//! download here.

use std::path::{Path, PathBuf};

use crate::error::ClassificationError;
use crate::host::{HostEnvironment, PackageFamily};
use crate::{APP_NAME, REPO_NAME, REPO_OWNER};

/// A release artifact for a resolved package family and a fixed version.
///
/// Immutable after creation except for `local_path`, which is populated
/// exactly once after a successful, non-empty download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifact {
    /// Release version, without the `v` tag prefix
    pub version: String,
    /// Family the artifact was resolved for
    pub family: PackageFamily,
    /// Release asset filename
    pub filename: String,
    /// Full download URL
    pub download_url: String,
    /// Local path, set after download
    pub local_path: Option<PathBuf>,
}

impl ReleaseArtifact {
    /// Resolve the artifact for a family and release version.
    ///
    /// Returns `Ok(None)` for [`PackageFamily::ArchAur`] and an error for
    /// [`PackageFamily::Unknown`] carrying the offending host identity.
    pub fn resolve(
        host: &HostEnvironment,
        family: PackageFamily,
        version: &str,
    ) -> Result<Option<Self>, ClassificationError> {
        let filename = match family {
            PackageFamily::DebianApt => format!("{APP_NAME}_{version}_amd64.deb"),
            // Both RPM families share one artifact.
            PackageFamily::RpmDnf | PackageFamily::RpmZypper => {
                format!("{APP_NAME}-{version}-1.x86_64.rpm")
            }
            PackageFamily::ArchAur => return Ok(None),
            PackageFamily::Unknown => {
                return Err(ClassificationError::new(
                    &host.distro_id,
                    &host.distro_like,
                    &host.pretty_name,
                ))
            }
        };

        let download_url = format!(
            "https://github.com/{REPO_OWNER}/{REPO_NAME}/releases/download/v{version}/{filename}"
        );

        Ok(Some(Self {
            version: version.to_string(),
            family,
            filename,
            download_url,
            local_path: None,
        }))
    }

    /// The `.deb` payload used by the portable-bundle pipeline, regardless
    /// of the host family. Its contents are distribution-neutral.
    pub fn portable_payload(version: &str) -> Self {
        let filename = format!("{APP_NAME}_{version}_amd64.deb");
        let download_url = format!(
            "https://github.com/{REPO_OWNER}/{REPO_NAME}/releases/download/v{version}/{filename}"
        );
        Self {
            version: version.to_string(),
            family: PackageFamily::DebianApt,
            filename,
            download_url,
            local_path: None,
        }
    }

    /// Record the local path after a verified download.
    pub fn mark_downloaded(&mut self, path: impl Into<PathBuf>) {
        self.local_path = Some(path.into());
    }

    /// Local path of the downloaded artifact, if the download happened.
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostEnvironment {
        HostEnvironment::new("test", "", "Test Linux")
    }

    #[test]
    fn test_resolve_deb_template() {
        let artifact = ReleaseArtifact::resolve(&host(), PackageFamily::DebianApt, "26.02.15")
            .unwrap()
            .unwrap();
        assert_eq!(artifact.filename, "tac-writer_26.02.15_amd64.deb");
        assert_eq!(
            artifact.download_url,
            "https://github.com/narayanls/tac-writer/releases/download/v26.02.15/tac-writer_26.02.15_amd64.deb"
        );
        assert!(artifact.local_path.is_none());
    }

    #[test]
    fn test_resolve_rpm_shared_between_families() {
        let dnf = ReleaseArtifact::resolve(&host(), PackageFamily::RpmDnf, "26.02.15")
            .unwrap()
            .unwrap();
        let zypper = ReleaseArtifact::resolve(&host(), PackageFamily::RpmZypper, "26.02.15")
            .unwrap()
            .unwrap();
        assert_eq!(dnf.filename, "tac-writer-26.02.15-1.x86_64.rpm");
        assert_eq!(dnf.filename, zypper.filename);
        assert_eq!(dnf.download_url, zypper.download_url);
    }

    #[test]
    fn test_resolve_arch_has_no_artifact() {
        let resolved = ReleaseArtifact::resolve(&host(), PackageFamily::ArchAur, "26.02.15").unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_resolve_unknown_is_an_error() {
        let host = HostEnvironment::new("gentoo", "", "Gentoo Linux");
        let err = ReleaseArtifact::resolve(&host, PackageFamily::Unknown, "26.02.15").unwrap_err();
        assert_eq!(err.distro_id, "gentoo");
    }

    #[test]
    fn test_mark_downloaded() {
        let mut artifact = ReleaseArtifact::portable_payload("26.02.15");
        assert!(artifact.local_path().is_none());
        artifact.mark_downloaded("/tmp/tac-setup-1/tac-writer_26.02.15_amd64.deb");
        assert!(artifact.local_path().is_some());
    }
}

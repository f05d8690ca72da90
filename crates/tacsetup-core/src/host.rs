//! Host identity detection and package-family classification
//!
//! Reads the distribution identity from `/etc/os-release` and maps it to
//! the package family whose native tooling can install the release
//! artifact. Classification is a pure function of the three identity
//! strings; the match table is evaluated top to bottom so derivative
//! distributions that mention several families resolve deterministically
//! to the first one.

use std::fmt;
use std::fs;

use crate::error::ClassificationError;

/// Path consulted for distribution identity.
const OS_RELEASE: &str = "/etc/os-release";

/// Host identity as reported by os-release. Immutable once detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    /// `ID` field (e.g. "ubuntu", "opensuse-tumbleweed")
    pub distro_id: String,
    /// `ID_LIKE` field (e.g. "debian", "suse")
    pub distro_like: String,
    /// `PRETTY_NAME` field (e.g. "openSUSE Tumbleweed")
    pub pretty_name: String,
}

/// Package family a host resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFamily {
    /// Arch family: no prebuilt artifact, install delegated to an AUR helper
    ArchAur,
    /// Debian family: `.deb` artifact installed through apt
    DebianApt,
    /// Fedora/RHEL family: `.rpm` artifact installed through dnf
    RpmDnf,
    /// SUSE family: `.rpm` artifact installed through zypper
    RpmZypper,
    /// No known family matched
    Unknown,
}

impl fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArchAur => write!(f, "Arch/AUR"),
            Self::DebianApt => write!(f, "Debian/APT"),
            Self::RpmDnf => write!(f, "RPM/DNF"),
            Self::RpmZypper => write!(f, "RPM/Zypper"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Ordered match table: first row whose needle appears in the identity
/// strings wins. Arch derivatives often carry `ID_LIKE=arch` next to their
/// own ID, so the Arch row must come before the Debian and RPM rows.
const FAMILY_TABLE: &[(&[&str], PackageFamily)] = &[
    (
        &["arch", "manjaro", "endeavouros", "garuda", "artix"],
        PackageFamily::ArchAur,
    ),
    (
        &[
            "debian",
            "ubuntu",
            "linuxmint",
            "mint",
            "pop",
            "elementary",
            "zorin",
            "kali",
        ],
        PackageFamily::DebianApt,
    ),
    (
        &["fedora", "rhel", "centos", "rocky", "almalinux", "nobara"],
        PackageFamily::RpmDnf,
    ),
    (&["suse", "sles"], PackageFamily::RpmZypper),
];

impl HostEnvironment {
    /// Build from already-known identity strings.
    pub fn new(
        distro_id: impl Into<String>,
        distro_like: impl Into<String>,
        pretty_name: impl Into<String>,
    ) -> Self {
        Self {
            distro_id: distro_id.into(),
            distro_like: distro_like.into(),
            pretty_name: pretty_name.into(),
        }
    }

    /// Detect the running host from `/etc/os-release`.
    ///
    /// A missing or unreadable file yields empty identity strings, which
    /// classify as [`PackageFamily::Unknown`].
    pub fn detect() -> Self {
        let content = fs::read_to_string(OS_RELEASE).unwrap_or_default();
        let host = Self::from_os_release(&content);
        tracing::debug!(
            id = %host.distro_id,
            id_like = %host.distro_like,
            pretty = %host.pretty_name,
            "detected host identity"
        );
        host
    }

    /// Parse the `ID`, `ID_LIKE` and `PRETTY_NAME` fields out of
    /// os-release content. Values may be double-quoted.
    pub fn from_os_release(content: &str) -> Self {
        let mut id = String::new();
        let mut id_like = String::new();
        let mut pretty = String::new();

        for line in content.lines() {
            let line = line.trim();
            if let Some(value) = line.strip_prefix("ID=") {
                id = unquote(value).to_lowercase();
            } else if let Some(value) = line.strip_prefix("ID_LIKE=") {
                id_like = unquote(value).to_lowercase();
            } else if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
                pretty = unquote(value).to_string();
            }
        }

        Self {
            distro_id: id,
            distro_like: id_like,
            pretty_name: pretty,
        }
    }

    /// Map the identity strings to exactly one package family.
    pub fn classify(&self) -> PackageFamily {
        let haystack = format!(
            "{} {} {}",
            self.distro_id,
            self.distro_like,
            self.pretty_name.to_lowercase()
        );

        for (needles, family) in FAMILY_TABLE {
            if needles.iter().any(|needle| haystack.contains(needle)) {
                return *family;
            }
        }

        PackageFamily::Unknown
    }

    /// Like [`classify`](Self::classify), but turns `Unknown` into the
    /// fatal error the native-install path reports.
    pub fn classify_native(&self) -> Result<PackageFamily, ClassificationError> {
        match self.classify() {
            PackageFamily::Unknown => Err(ClassificationError::new(
                &self.distro_id,
                &self.distro_like,
                &self.pretty_name,
            )),
            family => Ok(family),
        }
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"')
}

//! GitHub releases lookup
//!
//! Release tags are calendar-style (`v26.02.15-1733`), so ordering is a
//! segment-wise numeric comparison rather than semver.

use std::cmp::Ordering;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::debug;

use tacsetup_core::{REPO_NAME, REPO_OWNER};

/// Default GitHub API endpoint.
const GITHUB_API: &str = "https://api.github.com";

/// Release information.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Release tag (e.g. "v26.02.15")
    pub tag_name: String,

    /// Release name
    pub name: Option<String>,

    /// Release body (changelog)
    pub body: Option<String>,

    /// Whether this is a prerelease
    #[serde(default)]
    pub prerelease: bool,

    /// Whether this is a draft
    #[serde(default)]
    pub draft: bool,

    /// Release assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Release asset.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset name
    pub name: String,

    /// Download URL
    pub browser_download_url: String,

    /// Asset size in bytes
    #[serde(default)]
    pub size: u64,
}

impl Release {
    /// Version without the `v` tag prefix.
    pub fn version(&self) -> &str {
        self.tag_name.trim_start_matches('v')
    }

    /// Find an x86-64 asset whose name ends with `suffix`, skipping ARM
    /// builds the way the in-app update checker does.
    pub fn find_asset(&self, suffix: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| {
            let name = asset.name.to_lowercase();
            name.ends_with(suffix) && !name.contains("arm") && !name.contains("aarch64")
        })
    }
}

/// Client for the project's GitHub releases.
pub struct ReleaseClient {
    client: reqwest::Client,
    api_base: String,
}

impl ReleaseClient {
    /// Create a client against api.github.com.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("TAC-Writer-Installer/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_base: GITHUB_API.to_string(),
        })
    }

    /// Point at a different API base. Test hook.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Fetch the latest published release.
    pub async fn latest(&self) -> Result<Release> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base, REPO_OWNER, REPO_NAME
        );
        debug!(%url, "fetching latest release");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("failed to fetch release: {}", response.status()));
        }

        let release: Release = response.json().await?;
        if release.draft || release.prerelease {
            return Err(anyhow!(
                "latest release {} is not a published build",
                release.tag_name
            ));
        }
        Ok(release)
    }
}

/// Compare two dotted numeric versions segment-wise, padding the shorter
/// one with zeros. Non-numeric fragments are skipped, so `26.02.15-1733`
/// compares as `[26, 2, 15, 1733]`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn segments(version: &str) -> Vec<u64> {
        version
            .replace('-', ".")
            .split('.')
            .filter_map(|part| part.parse().ok())
            .collect()
    }

    let mut left = segments(a);
    let mut right = segments(b);
    let length = left.len().max(right.len());
    left.resize(length, 0);
    right.resize(length, 0);
    left.cmp(&right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release_with_assets(names: &[&str]) -> Release {
        Release {
            tag_name: "v26.02.15".to_string(),
            name: None,
            body: None,
            prerelease: false,
            draft: false,
            assets: names
                .iter()
                .map(|name| ReleaseAsset {
                    name: (*name).to_string(),
                    browser_download_url: format!("https://example.com/{name}"),
                    size: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_version_strips_tag_prefix() {
        let release = release_with_assets(&[]);
        assert_eq!(release.version(), "26.02.15");
    }

    #[test]
    fn test_find_asset_skips_arm_builds() {
        let release = release_with_assets(&[
            "tac-writer_26.02.15_arm64.deb",
            "tac-writer-26.02.15-aarch64.rpm",
            "tac-writer_26.02.15_amd64.deb",
        ]);
        let asset = release.find_asset(".deb").unwrap();
        assert_eq!(asset.name, "tac-writer_26.02.15_amd64.deb");
        assert!(release.find_asset(".AppImage").is_none());
    }

    #[test]
    fn test_compare_versions_ordering() {
        assert_eq!(compare_versions("26.02.15", "26.02.15"), Ordering::Equal);
        assert_eq!(compare_versions("26.02.15", "26.03.01"), Ordering::Less);
        assert_eq!(compare_versions("27.01.01", "26.12.31"), Ordering::Greater);
    }

    #[test]
    fn test_compare_versions_pads_shorter_side() {
        assert_eq!(compare_versions("26.02", "26.02.0"), Ordering::Equal);
        assert_eq!(compare_versions("26.02", "26.02.1"), Ordering::Less);
    }

    #[test]
    fn test_compare_versions_build_suffix() {
        assert_eq!(
            compare_versions("26.02.15-1733", "26.02.15-1800"),
            Ordering::Less
        );
        assert_eq!(
            compare_versions("26.02.15-1733", "26.02.15"),
            Ordering::Greater
        );
    }
}

//! Release lookup and artifact download
//!
//! Talks to the GitHub releases API to fix the release version, then
//! streams the chosen artifact to disk while relaying progress events and
//! writing a transfer log for diagnostics.

pub mod download;
pub mod releases;

pub use download::{DownloadError, Downloader};
pub use releases::{compare_versions, Release, ReleaseAsset, ReleaseClient};

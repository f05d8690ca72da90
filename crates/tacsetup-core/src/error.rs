//! Classification error type

use thiserror::Error;

/// The host's identity strings matched no supported package family.
///
/// This is fatal for the native-install path: there is no package manager
/// to hand the artifact to, and no retry will change the host's identity.
/// The portable-bundle path is not blocked by it.
#[derive(Error, Debug, Clone)]
#[error("unsupported distribution: {pretty_name:?} (ID={distro_id:?}, ID_LIKE={distro_like:?})")]
pub struct ClassificationError {
    /// `ID` field from os-release
    pub distro_id: String,
    /// `ID_LIKE` field from os-release
    pub distro_like: String,
    /// `PRETTY_NAME` field from os-release
    pub pretty_name: String,
}

impl ClassificationError {
    /// Build from the host identity strings that failed to classify.
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
}

//! Shared path helpers

use std::path::PathBuf;

/// Get the user's home directory.
///
/// Prefers the HOME environment variable over dirs::home_dir() so that
/// sandboxed or container invocations with an overridden HOME resolve the
/// same directory the generated shell jobs will.
pub fn home_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    dirs::home_dir()
}

/// Directory the finished portable bundle is moved to.
pub fn downloads_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(|| home_dir().map(|home| home.join("Downloads")))
}

/// Per-user data directory of the installed application, where the
/// installed version is recorded for the in-app update checker.
pub fn app_data_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".local/share").join(crate::APP_NAME))
}

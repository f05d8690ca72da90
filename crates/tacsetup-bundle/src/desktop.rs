//! Desktop-entry and icon discovery
//!
//! The staged tree is searched for the application's `.desktop` metadata
//! (fatal if absent: without a launch command there is no bundle) and its
//! icon (a placeholder is synthesized if absent).

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Icon extensions accepted during the pattern search.
const ICON_EXTENSIONS: &[&str] = &["png", "svg", "xpm"];

/// Placeholder icon written when the package ships none.
pub const PLACEHOLDER_ICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="128" height="128">
  <rect width="128" height="128" rx="16" fill="#3c6eb4"/>
  <text x="64" y="80" font-family="sans-serif" font-size="56" fill="#ffffff" text-anchor="middle">T</text>
</svg>
"##;

/// Parsed `[Desktop Entry]` fields the bundle needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    /// `Name=` value
    pub name: String,
    /// `Exec=` binary, with arguments and field codes stripped
    pub exec: String,
    /// `Icon=` value
    pub icon: Option<String>,
}

/// Find the first `.desktop` file under `root`.
pub fn find_desktop_file(root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "desktop")
        })
        .map(|entry| entry.into_path())
}

/// Parse the `[Desktop Entry]` section. Returns `None` when no launch
/// command is declared.
pub fn parse_desktop_entry(content: &str) -> Option<DesktopEntry> {
    let mut in_entry = false;
    let mut name = None;
    let mut exec = None;
    let mut icon = None;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry {
            continue;
        }
        if let Some(value) = line.strip_prefix("Name=") {
            name.get_or_insert_with(|| value.to_string());
        } else if let Some(value) = line.strip_prefix("Exec=") {
            exec.get_or_insert_with(|| exec_binary(value));
        } else if let Some(value) = line.strip_prefix("Icon=") {
            icon.get_or_insert_with(|| value.to_string());
        }
    }

    Some(DesktopEntry {
        name: name.unwrap_or_else(|| "Application".to_string()),
        exec: exec.filter(|binary| !binary.is_empty())?,
        icon,
    })
}

/// First word of the Exec line, without path or `%f`-style field codes.
fn exec_binary(exec_line: &str) -> String {
    exec_line
        .split_whitespace()
        .find(|word| !word.starts_with('%'))
        .map(|word| {
            word.rsplit('/')
                .next()
                .unwrap_or(word)
                .to_string()
        })
        .unwrap_or_default()
}

/// Search `root` for an icon file named after the desktop entry's icon.
pub fn find_icon(root: &Path, icon_name: &str) -> Option<PathBuf> {
    let found = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .file_stem()
                    .is_some_and(|stem| stem == icon_name)
                && entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ICON_EXTENSIONS.contains(&ext))
        })
        .map(|entry| entry.into_path());

    if found.is_none() {
        debug!(icon_name, "no icon found in staged tree");
    }
    found
}

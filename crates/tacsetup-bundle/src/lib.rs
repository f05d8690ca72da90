//! Portable-bundle pipeline
//!
//! Builds a relocatable, double-clickable AppImage from the project's
//! `.deb` release package: extract the data payload, retarget the
//! launcher, synthesize an `AppRun` entry point and hand the staged tree
//! to `appimagetool`.

pub mod ar;
pub mod builder;
pub mod desktop;
pub mod payload;

pub use builder::{BuildContext, BuildError, BundleBuilder};
pub use desktop::DesktopEntry;
pub use payload::Codec;

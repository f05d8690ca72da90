//! Core types for the TAC Writer installation orchestrator
//!
//! This crate holds the pieces every pipeline shares: host identity
//! classification, release-artifact resolution, the session working
//! directory with its sentinel files, and shared path helpers.

pub mod artifact;
pub mod error;
pub mod host;
pub mod session;
pub mod utils;

pub use artifact::ReleaseArtifact;
pub use error::ClassificationError;
pub use host::{HostEnvironment, PackageFamily};
pub use session::Session;

/// Package name of the target application, as published on GitHub and AUR.
pub const APP_NAME: &str = "tac-writer";

/// GitHub repository owner for release downloads.
pub const REPO_OWNER: &str = "narayanls";

/// GitHub repository name for release downloads.
pub const REPO_NAME: &str = "tac-writer";

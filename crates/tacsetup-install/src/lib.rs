//! Native installation paths
//!
//! The supervisor drives the headless privileged install through the
//! family's package manager; the repair workflow is the zypper-specific
//! fallback job; the AUR module delegates Arch hosts to their helper.

pub mod aur;
pub mod repair;
pub mod supervisor;

pub use aur::{aur_spec, find_aur_helper};
pub use repair::{repair_spec, runtime_manifest};
pub use supervisor::{install_native, InstallError};

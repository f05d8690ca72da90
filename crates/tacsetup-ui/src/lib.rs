//! Dialog and progress contracts for the installation orchestrator
//!
//! The orchestrator only ever talks to [`Dialog`] and [`Progress`]; which
//! backend renders them is a startup detail. The zenity backend drives the
//! GUI dialogs the original installer shows; the terminal backend keeps
//! headless invocations usable.

pub mod dialog;
pub mod term;
pub mod zenity;

pub use dialog::{Dialog, Progress};
pub use term::TermDialog;
pub use zenity::ZenityDialog;

/// Pick the dialog backend for this invocation: zenity when it is
/// installed and a display is reachable, the terminal otherwise.
pub fn detect_backend() -> Box<dyn Dialog> {
    if ZenityDialog::available() {
        tracing::debug!("dialog backend: zenity");
        Box::new(ZenityDialog::new())
    } else {
        tracing::debug!("dialog backend: terminal");
        Box::new(TermDialog::new())
    }
}

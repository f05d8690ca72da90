//! Portable-bundle pipeline
//!
//! Self-contained alternative to the native install: works even when the
//! host classified as Unknown, since nothing here touches a package
//! manager.

use anyhow::Result;

use tacsetup_bundle::BundleBuilder;
use tacsetup_core::Session;
use tacsetup_fetch::ReleaseClient;
use tacsetup_ui::Dialog;

/// Run the portable pipeline; returns the process exit code.
pub async fn run(session: &Session, dialog: &dyn Dialog) -> Result<i32> {
    let release = match ReleaseClient::new()?.latest().await {
        Ok(release) => release,
        Err(err) => {
            dialog.error(&format!(
                "Could not look up the latest TAC Writer release.\n\n{err}"
            ));
            return Ok(1);
        }
    };

    let builder = BundleBuilder::new(session, dialog);
    match builder.build_portable(release.version()).await {
        Ok(path) => {
            dialog.info(&format!(
                "The portable bundle is ready:\n{}\n\nMake it executable and double-click to run.",
                path.display()
            ));
            Ok(0)
        }
        Err(err) => {
            if dialog.question(
                "Bundle build failed",
                &format!("{err}\n\nView the build log?"),
                "View log",
                "Close",
            ) {
                dialog.text_view(&session.build_log(), "Build log");
            }
            Ok(1)
        }
    }
}

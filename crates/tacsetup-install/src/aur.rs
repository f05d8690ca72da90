//! AUR-helper delegation
//!
//! Arch-family hosts build from the AUR recipe instead of a prebuilt
//! artifact, so the whole install is one external job around the user's
//! AUR helper.

use tacsetup_core::{Session, APP_NAME};
use tacsetup_jobs::script::sh_quote;
use tacsetup_jobs::JobSpec;

/// Script filename for the AUR job.
pub const AUR_JOB: &str = "aur-install.sh";

/// Helpers probed for, in preference order.
const AUR_HELPERS: &[&str] = &["yay", "paru"];

/// First available AUR helper on PATH.
pub fn find_aur_helper() -> Option<&'static str> {
    AUR_HELPERS
        .iter()
        .copied()
        .find(|helper| which::which(helper).is_ok())
}

/// Build the AUR install job. The script leaves the session's success
/// marker behind so the orchestrator can confirm the install beyond the
/// exit code.
pub fn aur_spec(helper: &str, session: &Session) -> JobSpec {
    let success_flag = sh_quote(&session.success_flag().display().to_string());
    let body = format!(
        "set -e\n\
         echo 'Installing {APP_NAME} from the AUR with {helper}...'\n\
         {helper} -S --noconfirm {APP_NAME}\n\
         printf 'installed\\n' > {success_flag}",
    );

    JobSpec {
        name: AUR_JOB,
        title: "Installing from the AUR".to_string(),
        body,
        pause_before_exit: false,
        success_message: "TAC Writer was installed from the AUR.".to_string(),
        error_message:
            "The AUR build failed. Check the terminal output for the failing step.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aur_spec_invokes_helper_against_the_package() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::at(tmp.path(), false);
        let spec = aur_spec("yay", &session);

        assert!(spec.body.contains("yay -S --noconfirm tac-writer"));
        assert_eq!(spec.name, AUR_JOB);
        assert!(!spec.pause_before_exit);
    }

    #[test]
    fn test_aur_spec_writes_success_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::at(tmp.path(), false);
        let spec = aur_spec("paru", &session);
        let flag = session.success_flag().display().to_string();
        assert!(spec.body.contains(&flag));
    }

    #[test]
    fn test_find_aur_helper_only_returns_known_names() {
        if let Some(helper) = find_aur_helper() {
            assert!(AUR_HELPERS.contains(&helper));
        }
    }
}

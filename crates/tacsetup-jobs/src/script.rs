//! Job-script generation
//!
//! A job is rendered as a bash script: a header binding the sentinel
//! paths, the caller's body in a subshell, and the synchronization
//! trailer. The trailer records the body's exit code in the done-flag,
//! optionally pauses for acknowledgment, waits for the close-flag and
//! finally exits with the original code.

use tacsetup_core::Session;

/// Description of one external job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Script filename inside the session directory
    pub name: &'static str,
    /// Title shown on the progress dialog
    pub title: String,
    /// Bash body; runs in a subshell with `set -e` semantics left to the
    /// body itself
    pub body: String,
    /// Pause on a read prompt before the close-flag wait, keeping the
    /// terminal readable until the user acknowledges
    pub pause_before_exit: bool,
    /// Dialog text on success
    pub success_message: String,
    /// Dialog text on failure
    pub error_message: String,
}

impl JobSpec {
    /// Render the full script for `session`.
    pub fn render(&self, session: &Session) -> String {
        let done = sh_quote(&session.done_flag().display().to_string());
        let close = sh_quote(&session.close_flag().display().to_string());
        let dir = sh_quote(&session.dir().display().to_string());

        let pause = if self.pause_before_exit {
            "printf '\\nPress Enter to close this window... '\nread -r _ || true\n"
        } else {
            ""
        };

        format!(
            "#!/usr/bin/env bash\n\
             # Generated job script; coordinates with the installer through flag files.\n\
             set -u\n\
             DONE_FLAG={done}\n\
             CLOSE_FLAG={close}\n\
             SESSION_DIR={dir}\n\
             \n\
             (\n\
             {body}\n\
             )\n\
             rc=$?\n\
             if [ \"$rc\" -eq 0 ]; then\n\
             \tprintf 'success\\n' > \"$DONE_FLAG\"\n\
             else\n\
             \tprintf 'error\\n' > \"$DONE_FLAG\"\n\
             fi\n\
             {pause}\
             while [ ! -e \"$CLOSE_FLAG\" ] && [ -d \"$SESSION_DIR\" ]; do\n\
             \tsleep 1\n\
             done\n\
             exit \"$rc\"\n",
            body = self.body,
        )
    }
}

/// Single-quote `value` for safe interpolation into bash.
pub fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

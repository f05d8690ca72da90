//! Zenity dialog backend
//!
//! Each dialog is one `zenity` invocation. The progress window is a
//! long-lived child whose stdin receives the percent and `# message`
//! lines zenity expects.

use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::dialog::{Dialog, Progress};

/// Window title used when a caller does not provide one.
const APP_TITLE: &str = "TAC Writer Installer";

/// Dialog backend shelling out to zenity.
#[derive(Debug, Default)]
pub struct ZenityDialog;

impl ZenityDialog {
    pub fn new() -> Self {
        Self
    }

    /// True when zenity is installed and a display is reachable.
    pub fn available() -> bool {
        if which::which("zenity").is_err() {
            return false;
        }
        std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
    }

    fn run(&self, args: &[&str]) -> Option<std::process::Output> {
        match Command::new("zenity").args(args).output() {
            Ok(output) => Some(output),
            Err(err) => {
                tracing::warn!(error = %err, "zenity invocation failed");
                None
            }
        }
    }
}

impl Dialog for ZenityDialog {
    fn question(&self, title: &str, text: &str, ok_label: &str, cancel_label: &str) -> bool {
        self.run(&[
            "--question",
            "--title",
            title,
            "--text",
            text,
            "--ok-label",
            ok_label,
            "--cancel-label",
            cancel_label,
        ])
        .map(|output| output.status.success())
        .unwrap_or(false)
    }

    fn choose(&self, title: &str, text: &str, options: &[&str]) -> Option<usize> {
        let mut args = vec![
            "--list",
            "--hide-header",
            "--title",
            title,
            "--text",
            text,
            "--column",
            "Option",
        ];
        args.extend_from_slice(options);

        let output = self.run(&args)?;
        if !output.status.success() {
            return None;
        }
        let selection = String::from_utf8_lossy(&output.stdout);
        let selection = selection.trim();
        options.iter().position(|option| *option == selection)
    }

    fn info(&self, text: &str) {
        self.run(&["--info", "--title", APP_TITLE, "--text", text]);
    }

    fn error(&self, text: &str) {
        self.run(&["--error", "--title", APP_TITLE, "--text", text]);
    }

    fn text_view(&self, path: &Path, title: &str) {
        let path = path.display().to_string();
        self.run(&[
            "--text-info",
            "--title",
            title,
            "--filename",
            &path,
            "--width",
            "700",
            "--height",
            "500",
        ]);
    }

    fn progress(&self, title: &str, pulsating: bool) -> Box<dyn Progress> {
        let mut args = vec![
            "--progress".to_string(),
            "--title".to_string(),
            title.to_string(),
            "--auto-close".to_string(),
            "--no-cancel".to_string(),
        ];
        if pulsating {
            args.push("--pulsate".to_string());
        } else {
            args.push("--percentage=0".to_string());
        }

        match Command::new("zenity")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
        {
            Ok(child) => Box::new(ZenityProgress { child: Some(child) }),
            Err(err) => {
                tracing::warn!(error = %err, "zenity progress window failed to open");
                Box::new(crate::dialog::NullProgress)
            }
        }
    }
}

/// Progress window backed by a running zenity child.
pub struct ZenityProgress {
    child: Option<Child>,
}

impl ZenityProgress {
    fn feed(&mut self, line: &str) {
        if let Some(child) = self.child.as_mut() {
            if let Some(stdin) = child.stdin.as_mut() {
                if writeln!(stdin, "{line}").is_err() {
                    // Window was closed; stop feeding it.
                    self.child = None;
                }
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut child) = self.child.take() {
            drop(child.stdin.take());
            let _ = child.wait();
        }
    }
}

impl Progress for ZenityProgress {
    fn set(&mut self, percent: u8, message: &str) {
        self.feed(&format!("# {message}"));
        self.feed(&percent.min(100).to_string());
    }

    fn message(&mut self, message: &str) {
        self.feed(&format!("# {message}"));
    }

    fn finish(&mut self) {
        self.feed("100");
        self.close();
    }
}

impl Drop for ZenityProgress {
    fn drop(&mut self) {
        self.close();
    }
}

//! Terminal-emulator detection
//!
//! A fixed preference list of known emulators; the first one present on
//! PATH wins. Each entry knows the flag that makes the emulator run a
//! command instead of a shell.

use std::fmt;

/// A terminal emulator and its execute flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    /// Binary name
    pub command: &'static str,
    /// Flag that introduces the command to execute
    pub exec_flag: &'static str,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)
    }
}

/// Preference-ordered emulator list.
pub const TERMINALS: &[Terminal] = &[
    Terminal { command: "gnome-terminal", exec_flag: "--" },
    Terminal { command: "konsole", exec_flag: "-e" },
    Terminal { command: "xfce4-terminal", exec_flag: "-e" },
    Terminal { command: "mate-terminal", exec_flag: "-e" },
    Terminal { command: "alacritty", exec_flag: "-e" },
    Terminal { command: "kitty", exec_flag: "-e" },
    Terminal { command: "xterm", exec_flag: "-e" },
    Terminal { command: "tilix", exec_flag: "-e" },
    Terminal { command: "terminator", exec_flag: "-x" },
];

impl Terminal {
    /// First emulator from the preference list available on PATH.
    pub fn detect() -> Option<Terminal> {
        TERMINALS
            .iter()
            .copied()
            .find(|terminal| which::which(terminal.command).is_ok())
    }

    /// Names of all candidates, for error reporting.
    pub fn candidates() -> String {
        TERMINALS
            .iter()
            .map(|terminal| terminal.command)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

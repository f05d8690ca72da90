//! Terminal dialog backend
//!
//! Fallback for invocations without zenity or a display: questions and
//! lists go through dialoguer, progress through indicatif.

use std::path::Path;
use std::time::Duration;

use console::style;
use dialoguer::{Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::dialog::{Dialog, Progress};

/// Dialog backend rendering on the controlling terminal.
#[derive(Debug, Default)]
pub struct TermDialog;

impl TermDialog {
    pub fn new() -> Self {
        Self
    }
}

impl Dialog for TermDialog {
    fn question(&self, title: &str, text: &str, ok_label: &str, cancel_label: &str) -> bool {
        println!("\n{}", style(title).bold());
        Confirm::new()
            .with_prompt(format!("{text} [{ok_label}/{cancel_label}]"))
            .default(true)
            .interact()
            .unwrap_or(false)
    }

    fn choose(&self, title: &str, text: &str, options: &[&str]) -> Option<usize> {
        println!("\n{}", style(title).bold());
        Select::new()
            .with_prompt(text.to_string())
            .items(options)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()
    }

    fn info(&self, text: &str) {
        println!("{} {}", style("ℹ").blue().bold(), text);
    }

    fn error(&self, text: &str) {
        eprintln!("{} {}", style("✗").red().bold(), text);
    }

    fn text_view(&self, path: &Path, title: &str) {
        println!("\n{}", style(title).bold().underlined());
        match std::fs::read_to_string(path) {
            Ok(content) => println!("{content}"),
            Err(err) => eprintln!(
                "{} could not read {}: {err}",
                style("✗").red().bold(),
                path.display()
            ),
        }
    }

    fn progress(&self, title: &str, pulsating: bool) -> Box<dyn Progress> {
        let bar = if pulsating {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.blue} {msg}")
                    .expect("static template")
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            let bar = ProgressBar::new(100);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}",
                )
                .expect("static template")
                .progress_chars("#>-"),
            );
            bar
        };
        bar.set_message(title.to_string());
        Box::new(TermProgress { bar })
    }
}

/// Progress window backed by an indicatif bar.
pub struct TermProgress {
    bar: ProgressBar,
}

impl Progress for TermProgress {
    fn set(&mut self, percent: u8, message: &str) {
        self.bar.set_position(u64::from(percent.min(100)));
        self.bar.set_message(message.to_string());
    }

    fn message(&mut self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

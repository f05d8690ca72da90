//! Dialog and progress traits

use std::path::Path;

/// User-facing dialog surface.
///
/// Mirrors the dialog kinds the installer needs: a yes/no question, a
/// pick-one list, informational and error notices, a log viewer, and a
/// progress window fed by `(percent, message)` events.
pub trait Dialog: Send + Sync {
    /// Ask a yes/no question. Returns true for the ok choice.
    fn question(&self, title: &str, text: &str, ok_label: &str, cancel_label: &str) -> bool;

    /// Offer a list of options. Returns the selected index, or `None` if
    /// the user dismissed the dialog.
    fn choose(&self, title: &str, text: &str, options: &[&str]) -> Option<usize>;

    /// Show an informational notice.
    fn info(&self, text: &str);

    /// Show an error notice.
    fn error(&self, text: &str);

    /// Show the contents of a log file for inspection.
    fn text_view(&self, path: &Path, title: &str);

    /// Open a progress window. `pulsating` windows indicate activity
    /// without a known completion fraction.
    fn progress(&self, title: &str, pulsating: bool) -> Box<dyn Progress>;
}

/// Live progress window, driven by a stream of events terminating at 100.
pub trait Progress: Send {
    /// Report a completion percentage and a status message.
    fn set(&mut self, percent: u8, message: &str);

    /// Update the status message without a known percentage.
    fn message(&mut self, message: &str);

    /// Close the window. Implicitly reports completion.
    fn finish(&mut self);
}

/// Recording dialog for tests: answers every question with a fixed choice
/// and captures what was shown.
#[derive(Debug, Default)]
pub struct RecordingDialog {
    /// Answer returned from `question`
    pub answer: bool,
    /// Index returned from `choose`
    pub choice: Option<usize>,
    /// Captured notices, prefixed with their kind
    pub shown: std::sync::Mutex<Vec<String>>,
}

impl RecordingDialog {
    /// Dialog answering `answer` to questions and `choice` to lists.
    pub fn new(answer: bool, choice: Option<usize>) -> Self {
        Self {
            answer,
            choice,
            shown: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn record(&self, entry: String) {
        self.shown.lock().expect("dialog record lock").push(entry);
    }
}

impl Dialog for RecordingDialog {
    fn question(&self, title: &str, _text: &str, _ok: &str, _cancel: &str) -> bool {
        self.record(format!("question:{title}"));
        self.answer
    }

    fn choose(&self, title: &str, _text: &str, _options: &[&str]) -> Option<usize> {
        self.record(format!("choose:{title}"));
        self.choice
    }

    fn info(&self, text: &str) {
        self.record(format!("info:{text}"));
    }

    fn error(&self, text: &str) {
        self.record(format!("error:{text}"));
    }

    fn text_view(&self, path: &Path, _title: &str) {
        self.record(format!("text_view:{}", path.display()));
    }

    fn progress(&self, title: &str, _pulsating: bool) -> Box<dyn Progress> {
        self.record(format!("progress:{title}"));
        Box::new(NullProgress)
    }
}

/// Progress sink that discards everything. Used with [`RecordingDialog`].
pub struct NullProgress;

impl Progress for NullProgress {
    fn set(&mut self, _percent: u8, _message: &str) {}
    fn message(&mut self, _message: &str) {}
    fn finish(&mut self) {}
}

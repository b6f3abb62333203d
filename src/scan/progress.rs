use super::ScanOutcome;
use indicatif::{ProgressBar, ProgressStyle};

/// Receives per-file progress from the scanner
pub trait ScanProgress {
    fn start(&self, total: usize);
    /// Called before file `index` (1-based) is processed
    fn advance(&self, index: usize, message: &str);
    fn finish(&self, outcome: &ScanOutcome);
}

/// Terminal progress bar
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanProgress for BarProgress {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message("Finding unreferenced symbols...");
    }

    fn advance(&self, index: usize, message: &str) {
        self.bar.set_position(index.saturating_sub(1) as u64);
        self.bar.set_message(message.to_string());
    }

    fn finish(&self, outcome: &ScanOutcome) {
        if outcome.cancelled {
            self.bar.abandon_with_message("Scan cancelled");
        } else {
            self.bar.finish_with_message("Scan complete");
        }
    }
}

/// No output at all; used with `--quiet`
pub struct SilentProgress;

impl ScanProgress for SilentProgress {
    fn start(&self, _total: usize) {}
    fn advance(&self, _index: usize, _message: &str) {}
    fn finish(&self, _outcome: &ScanOutcome) {}
}

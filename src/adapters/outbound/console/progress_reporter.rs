use crate::ports::outbound::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

const BAR_TEMPLATE: &str =
    "   {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) - {msg}";

/// StderrProgressReporter adapter for reporting progress to stderr
///
/// Progress is written to stderr so it doesn't interfere with command output
/// on stdout. Uses indicatif for the rebuild progress bar. The bar sits
/// behind a mutex because rebuild progress arrives from the aggregator task.
pub struct StderrProgressReporter {
    progress_bar: Mutex<Option<ProgressBar>>,
}

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self {
            progress_bar: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        match ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            Ok(style) => style.progress_chars("=>-"),
            Err(_) => ProgressStyle::default_bar(),
        }
    }

    fn get_or_create_progress_bar(&self, total: usize) -> Option<ProgressBar> {
        let mut slot = self.progress_bar.lock().ok()?;
        if let Some(pb) = slot.as_ref() {
            if pb.length() == Some(total as u64) {
                return Some(pb.clone());
            }
            pb.finish_and_clear();
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::bar_style());
        *slot = Some(pb.clone());
        Some(pb)
    }

    fn finish_progress_bar(&self) {
        if let Ok(mut slot) = self.progress_bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        let Some(pb) = self.get_or_create_progress_bar(total) else {
            return;
        };
        pb.set_position(current as u64);
        if let Some(msg) = message {
            pb.set_message(msg.to_string());
        }
    }

    fn report_error(&self, message: &str) {
        self.finish_progress_bar();
        eprintln!("{}", message);
    }

    fn report_completion(&self, message: &str) {
        self.finish_progress_bar();
        eprintln!();
        eprintln!("{}", message);
    }
}

/// Discards everything; used when the caller wants machine-readable output only
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn report(&self, _message: &str) {}
    fn report_progress(&self, _current: usize, _total: usize, _message: Option<&str>) {}
    fn report_error(&self, _message: &str) {}
    fn report_completion(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_reporter_creation() {
        let reporter = StderrProgressReporter::new();
        // Can't easily test stderr output, but verify it doesn't panic
        reporter.report("Test message");
        reporter.report_progress(5, 10, Some("test"));
        reporter.report_error("Test error");
        reporter.report_completion("Test completion");
    }

    #[test]
    fn test_progress_bar_replaced_when_total_changes() {
        let reporter = StderrProgressReporter::default();
        reporter.report_progress(1, 10, None);
        reporter.report_progress(1, 20, None);
        let length = reporter
            .progress_bar
            .lock()
            .unwrap()
            .as_ref()
            .and_then(ProgressBar::length);
        assert_eq!(length, Some(20));
    }

    #[test]
    fn test_progress_reporter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StderrProgressReporter>();
    }
}

//! Progress display for CLI packaging runs.

use apppack_core::ProgressCallback;
use apppack_core::creation::EntryKind;
use console::Term;
use console::style;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use std::time::Duration;

/// CLI progress display implementing `ProgressCallback`.
///
/// Shows a spinner with the running entry count when attached to a TTY, and
/// prints the `compressed <path>` notices when verbose. Automatically cleans
/// up on drop.
pub struct CliProgress {
    bar: ProgressBar,
    notices: bool,
    term: Term,
}

impl CliProgress {
    /// Creates a new progress display.
    ///
    /// # Arguments
    ///
    /// * `spinner` - Draw the spinner
    /// * `notices` - Print a line per compressed entry
    #[must_use]
    pub fn new(spinner: bool, notices: bool) -> Self {
        let bar = if spinner {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} Packing [{pos} entries] {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            notices,
            term: Term::stdout(),
        }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }

    fn notice(&self, label: &str, path: &str) {
        let line = if console::colors_enabled() {
            format!("{} {path}", style(label).green())
        } else {
            format!("{label} {path}")
        };
        self.bar.suspend(|| {
            let _ = self.term.write_line(&line);
        });
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_entry_complete(&mut self, virtual_path: &str, _kind: EntryKind) {
        self.bar.inc(1);
        self.bar.set_message(virtual_path.to_string());
    }

    fn on_compressed_notice(&mut self, virtual_path: &str) {
        if self.notices {
            self.notice("compressed", virtual_path);
        }
    }

    fn on_duplicate_skipped(&mut self, virtual_path: &str) {
        if self.notices {
            self.notice("duplicate", virtual_path);
        }
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_counts_entries() {
        let mut progress = CliProgress::new(false, false);
        progress.on_entry_complete("conf/app.conf", EntryKind::File);
        progress.on_entry_complete("static/logo", EntryKind::Symlink);
        progress.on_duplicate_skipped("conf/app.conf");
        assert_eq!(progress.bar.position(), 2);
        progress.on_complete();
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn test_spinner_lifecycle() {
        let mut progress = CliProgress::new(true, false);
        progress.on_entry_complete("blog", EntryKind::File);
        assert_eq!(progress.bar.position(), 1);
        drop(progress);
    }
}

//! Progress reporting hooks for packaging.

use crate::creation::walker::EntryKind;

/// Receives notifications while entries are written.
///
/// All methods have no-op defaults except [`on_entry_complete`], which is
/// the one every consumer needs.
///
/// [`on_entry_complete`]: ProgressCallback::on_entry_complete
///
/// # Examples
///
/// ```
/// use apppack_core::ProgressCallback;
/// use apppack_core::creation::EntryKind;
///
/// struct Collect(Vec<String>);
///
/// impl ProgressCallback for Collect {
///     fn on_entry_complete(&mut self, virtual_path: &str, _kind: EntryKind) {
///         self.0.push(virtual_path.to_string());
///     }
/// }
/// ```
pub trait ProgressCallback {
    /// Called after an entry has been written to the archive.
    fn on_entry_complete(&mut self, virtual_path: &str, kind: EntryKind);

    /// Called with the verbose `compressed <path>` notice.
    ///
    /// Only invoked when the run is configured as verbose.
    fn on_compressed_notice(&mut self, virtual_path: &str) {
        let _ = virtual_path;
    }

    /// Called for an entry dropped because its virtual path was already
    /// written by an earlier include root.
    fn on_duplicate_skipped(&mut self, virtual_path: &str) {
        let _ = virtual_path;
    }

    /// Called once after the archive has been finalized successfully.
    fn on_complete(&mut self) {}
}

/// Progress callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_complete(&mut self, _virtual_path: &str, _kind: EntryKind) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        completed: Vec<String>,
        notices: Vec<String>,
    }

    impl ProgressCallback for Recorder {
        fn on_entry_complete(&mut self, virtual_path: &str, _kind: EntryKind) {
            self.completed.push(virtual_path.to_string());
        }

        fn on_compressed_notice(&mut self, virtual_path: &str) {
            self.notices.push(virtual_path.to_string());
        }
    }

    #[test]
    fn test_default_hooks_are_noops() {
        let mut recorder = Recorder::default();
        recorder.on_duplicate_skipped("a.txt");
        recorder.on_complete();
        assert!(recorder.completed.is_empty());
        assert!(recorder.notices.is_empty());
    }

    #[test]
    fn test_noop_progress_accepts_events() {
        let mut progress = NoopProgress;
        progress.on_entry_complete("a.txt", EntryKind::File);
        progress.on_compressed_notice("a.txt");
        progress.on_complete();
    }
}

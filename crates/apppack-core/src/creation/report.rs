//! Packaging operation reporting.

use crate::creation::walker::EntryKind;
use std::path::PathBuf;
use std::time::Duration;

/// Report of a packaging run.
///
/// # Examples
///
/// ```
/// use apppack_core::PackReport;
///
/// let mut report = PackReport::default();
/// report.files_added = 3;
/// report.symlinks_added = 1;
/// report.bytes_written = 1000;
/// report.bytes_compressed = 250;
///
/// assert_eq!(report.entries_added(), 4);
/// assert_eq!(report.compression_ratio(), 4.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackReport {
    /// Archive that was written.
    pub output_path: PathBuf,

    /// Regular files stored (including followed symlinks).
    pub files_added: usize,

    /// Symlinks stored as links.
    pub symlinks_added: usize,

    /// Entries dropped because their virtual path was already written.
    pub duplicates_skipped: usize,

    /// Uncompressed payload bytes of the stored files.
    pub bytes_written: u64,

    /// Size of the finished archive on disk.
    pub bytes_compressed: u64,

    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl PackReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries written to the archive.
    #[must_use]
    pub const fn entries_added(&self) -> usize {
        self.files_added + self.symlinks_added
    }

    /// Returns the compression ratio (uncompressed / compressed).
    ///
    /// Returns 0.0 if either side is 0.
    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_compressed == 0 || self.bytes_written == 0 {
            return 0.0;
        }
        self.bytes_written as f64 / self.bytes_compressed as f64
    }

    pub(crate) fn record(&mut self, kind: EntryKind, size: u64) {
        match kind {
            EntryKind::File => {
                self.files_added += 1;
                self.bytes_written += size;
            }
            EntryKind::Symlink => self.symlinks_added += 1,
        }
    }
}

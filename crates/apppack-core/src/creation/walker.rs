//! Depth-first tree walking with exclusion, pruning and deduplication.
//!
//! The walker visits include roots one after another and feeds every
//! accepted file or symlink to an [`ArchiveSink`]. Children are visited in
//! file-name order so the same tree always yields the same entry sequence.
//! The set of virtual paths already written lives for the whole session, so
//! when two roots contain the same virtual path the first one wins.

use crate::PackError;
use crate::Result;
use crate::creation::config::SymlinkPolicy;
use crate::creation::filters::ExclusionRules;
use crate::creation::filters::virtual_path;
use crate::creation::progress::ProgressCallback;
use crate::creation::report::PackReport;
use crate::creation::sink::ArchiveSink;
use std::collections::HashSet;
use std::fs;
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::trace;
use walkdir::WalkDir;

/// Kind of entry written to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file (or symlink resolved in follow mode).
    File,
    /// Symlink stored as a link.
    Symlink,
}

/// Walks include roots into a single archive sink.
///
/// # Examples
///
/// ```no_run
/// use apppack_core::NoopProgress;
/// use apppack_core::creation::filters::ExclusionRules;
/// use apppack_core::creation::tar::TarGzSink;
/// use apppack_core::creation::walker::TreeWalker;
/// use std::path::Path;
///
/// let rules = ExclusionRules::default();
/// let mut sink = TarGzSink::new(Vec::new(), None);
/// let mut progress = NoopProgress;
///
/// let mut walker = TreeWalker::new(&mut sink, &rules, &mut progress);
/// walker.walk_root(Path::new("/srv/app"))?;
/// let report = walker.into_report();
/// println!("{} entries", report.entries_added());
/// # Ok::<(), apppack_core::PackError>(())
/// ```
pub struct TreeWalker<'a, S: ArchiveSink> {
    sink: &'a mut S,
    rules: &'a ExclusionRules,
    progress: &'a mut dyn ProgressCallback,
    policy: SymlinkPolicy,
    output_path: Option<PathBuf>,
    verbose: bool,
    written: HashSet<String>,
    ancestors: Vec<PathBuf>,
    report: PackReport,
}

impl<'a, S: ArchiveSink> TreeWalker<'a, S> {
    /// Creates a walker with the default symlink policy and no output path.
    #[must_use]
    pub fn new(
        sink: &'a mut S,
        rules: &'a ExclusionRules,
        progress: &'a mut dyn ProgressCallback,
    ) -> Self {
        Self {
            sink,
            rules,
            progress,
            policy: SymlinkPolicy::default(),
            output_path: None,
            verbose: false,
            written: HashSet::new(),
            ancestors: Vec::new(),
            report: PackReport::default(),
        }
    }

    /// Sets how symlinks are archived.
    #[must_use]
    pub fn with_symlink_policy(mut self, policy: SymlinkPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the path of the archive being written so it is never packed
    /// into itself.
    ///
    /// Compared verbatim against the real paths under each root, so it
    /// should be spelled the same way the roots are (both canonical).
    #[must_use]
    pub fn with_output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables the per-entry `compressed` notice.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Walks one include root.
    ///
    /// On error the walk stops immediately; entries already handed to the
    /// sink stay there.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::SourceNotFound`] if the root does not exist, or
    /// the first I/O error raised while listing, reading or writing.
    pub fn walk_root(&mut self, root: &Path) -> Result<()> {
        let metadata = fs::metadata(root).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PackError::SourceNotFound {
                    path: root.to_path_buf(),
                }
            } else {
                PackError::Io(e)
            }
        })?;

        debug!(root = %root.display(), "walking include root");
        self.ancestors.clear();

        match self.iterate(root, root, metadata) {
            Err(e) if e.is_skip_subtree() => {
                debug!(root = %root.display(), "include root has nothing to pack");
                Ok(())
            }
            other => other,
        }
    }

    /// Virtual paths written so far, across all roots.
    #[must_use]
    pub const fn written(&self) -> &HashSet<String> {
        &self.written
    }

    /// Consumes the walker, returning the counters gathered so far.
    #[must_use]
    pub fn into_report(self) -> PackReport {
        self.report
    }

    fn iterate(&mut self, root: &Path, path: &Path, metadata: Metadata) -> Result<()> {
        trace!(path = %path.display(), "visiting");

        let metadata = if metadata.file_type().is_symlink() && self.policy == SymlinkPolicy::Follow
        {
            match fs::metadata(path) {
                Ok(target) => target,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "dangling symlink, skipped");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            metadata
        };

        let vpath = virtual_path(root, path)?;
        if !vpath.is_empty() && self.is_excluded(&vpath) {
            debug!(path = %vpath, "excluded");
            return Ok(());
        }

        self.visit(root, path, &vpath, &metadata)?;

        if !metadata.is_dir() {
            return Ok(());
        }

        let guarded = self.enter_directory(path)?;
        let result = self.iterate_children(root, path);
        if guarded {
            self.ancestors.pop();
        }
        result
    }

    fn iterate_children(&mut self, root: &Path, dir: &Path) -> Result<()> {
        for (child, metadata) in read_dir_sorted(dir)? {
            match self.iterate(root, &child, metadata) {
                Ok(()) => {}
                Err(PackError::SkipSubtree { path }) if path == child => {
                    debug!(path = %path.display(), "pruned empty directory");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Records `dir` as an ancestor when following symlinks, refusing to
    /// enter a directory that is already being walked.
    fn enter_directory(&mut self, dir: &Path) -> Result<bool> {
        if self.policy != SymlinkPolicy::Follow {
            return Ok(false);
        }

        let canonical = fs::canonicalize(dir)?;
        if self.ancestors.contains(&canonical) {
            return Err(PackError::Io(std::io::Error::other(format!(
                "file system loop detected: {} points to an ancestor ({})",
                dir.display(),
                canonical.display()
            ))));
        }

        self.ancestors.push(canonical);
        Ok(true)
    }

    fn visit(&mut self, root: &Path, path: &Path, vpath: &str, metadata: &Metadata) -> Result<()> {
        if self.output_path.as_deref() == Some(path) {
            debug!(path = %path.display(), "skipping the archive being written");
            return Ok(());
        }

        if metadata.is_dir() {
            if self.is_effectively_empty(root, path)? {
                return Err(PackError::SkipSubtree {
                    path: path.to_path_buf(),
                });
            }
            return Ok(());
        }

        let is_symlink = metadata.file_type().is_symlink();
        if is_symlink && self.policy == SymlinkPolicy::Skip {
            debug!(path = vpath, "symlink skipped");
            return Ok(());
        }

        if self.written.contains(vpath) {
            debug!(path = vpath, "already packed from an earlier root, dropped");
            self.report.duplicates_skipped += 1;
            self.progress.on_duplicate_skipped(vpath);
            return Ok(());
        }

        if !self.sink.compress(vpath, path, metadata)? {
            return Ok(());
        }

        self.written.insert(vpath.to_string());

        let kind = if is_symlink {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };
        self.report.record(kind, metadata.len());
        self.progress.on_entry_complete(vpath, kind);
        if self.verbose {
            self.progress.on_compressed_notice(vpath);
        }

        Ok(())
    }

    /// Returns `true` if no child of `dir` would survive exclusion and the
    /// symlink policy, looking through subdirectories recursively.
    ///
    /// A listing failure reports "not empty" so the real walk surfaces the
    /// error. Symlinked directories are not looked through.
    fn is_effectively_empty(&self, root: &Path, dir: &Path) -> Result<bool> {
        let Ok(children) = read_dir_sorted(dir) else {
            return Ok(false);
        };

        for (child, metadata) in children {
            let vpath = virtual_path(root, &child)?;
            if self.is_excluded(&vpath) {
                continue;
            }

            if metadata.file_type().is_symlink() {
                if self.policy == SymlinkPolicy::Skip {
                    continue;
                }
                return Ok(false);
            }

            if metadata.is_dir() {
                if !self.is_effectively_empty(root, &child)? {
                    return Ok(false);
                }
                continue;
            }

            if self.output_path.as_deref() == Some(child.as_path()) {
                continue;
            }

            return Ok(false);
        }

        Ok(true)
    }

    fn is_excluded(&self, vpath: &str) -> bool {
        let name = vpath.rsplit('/').next().unwrap_or(vpath);
        self.rules.is_excluded_name(name) || self.rules.is_excluded_path(vpath)
    }
}

/// Lists the immediate children of `dir` sorted by file name, with their
/// link metadata.
fn read_dir_sorted(dir: &Path) -> Result<Vec<(PathBuf, Metadata)>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.map_err(std::io::Error::from)?;
            let metadata = entry.metadata().map_err(std::io::Error::from)?;
            Ok((entry.into_path(), metadata))
        })
        .collect()
}

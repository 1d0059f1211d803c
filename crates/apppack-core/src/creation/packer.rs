//! Packaging orchestrator.

use crate::PackError;
use crate::Result;
use crate::creation::config::ArchiveFormat;
use crate::creation::config::PackConfig;
use crate::creation::filters::ExclusionRules;
use crate::creation::progress::NoopProgress;
use crate::creation::progress::ProgressCallback;
use crate::creation::report::PackReport;
use crate::creation::sink::ArchiveSink;
use crate::creation::tar::TarGzSink;
use crate::creation::walker::TreeWalker;
use crate::creation::zip::ZipSink;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Packs one or more include roots into a single archive.
///
/// All roots share one sink and one set of written virtual paths, so roots
/// are merged in the order they were added and the first root to produce a
/// virtual path wins.
///
/// # Examples
///
/// ```no_run
/// use apppack_core::PackConfig;
/// use apppack_core::Packer;
///
/// let report = Packer::new(PackConfig::new("dist/blog.tar.gz"))
///     .add_root("/tmp/apppack-build")
///     .add_root("/home/me/blog")
///     .create()?;
///
/// println!("Packed {} entries", report.entries_added());
/// # Ok::<(), apppack_core::PackError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Packer {
    config: PackConfig,
    roots: Vec<PathBuf>,
}

impl Packer {
    /// Creates a packer with no include roots.
    #[must_use]
    pub const fn new(config: PackConfig) -> Self {
        Self {
            config,
            roots: Vec::new(),
        }
    }

    /// Appends an include root.
    #[must_use]
    pub fn add_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.roots.push(path.as_ref().to_path_buf());
        self
    }

    /// Appends several include roots, in order.
    #[must_use]
    pub fn roots<P: AsRef<Path>>(mut self, paths: &[P]) -> Self {
        self.roots
            .extend(paths.iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Returns the configuration this packer runs with.
    #[must_use]
    pub const fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Creates the archive.
    ///
    /// # Errors
    ///
    /// See [`Packer::create_with_progress`].
    pub fn create(&self) -> Result<PackReport> {
        self.create_with_progress(&mut NoopProgress)
    }

    /// Creates the archive, reporting each written entry to `progress`.
    ///
    /// Configuration and include roots are checked before the output file
    /// is touched. Once the output exists, the archive is always finalized,
    /// even when a walk fails part way; the walk error is then returned and
    /// the file on disk must be treated as incomplete.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid or no include root was added
    /// - An include root does not exist or is not a directory
    /// - The output file cannot be created
    /// - Any entry cannot be read or written
    pub fn create_with_progress(&self, progress: &mut dyn ProgressCallback) -> Result<PackReport> {
        let start = Instant::now();

        self.config.validate()?;
        if self.roots.is_empty() {
            return Err(PackError::InvalidConfiguration {
                reason: "no include roots provided".to_string(),
            });
        }

        let rules = ExclusionRules::from_config(&self.config)?;
        info!(prefixes = ?rules.prefixes(), "excluding relpath prefix");
        info!(suffixes = ?rules.suffixes(), "excluding relpath suffix");
        let patterns: Vec<&str> = rules.patterns().collect();
        if !patterns.is_empty() {
            info!(regexes = ?patterns, "excluding filename regex");
        }

        let roots = resolve_roots(&self.roots)?;

        let output = &self.config.output_path;
        let file = File::create(output)?;
        let canonical_output = fs::canonicalize(output)?;
        let writer = BufWriter::new(file);
        let level = self.config.compression_level;

        let mut report = match self.config.format {
            ArchiveFormat::TarGz => pack_into(
                TarGzSink::new(writer, level),
                &rules,
                &roots,
                &self.config,
                &canonical_output,
                progress,
            ),
            ArchiveFormat::Zip => pack_into(
                ZipSink::new(writer, level),
                &rules,
                &roots,
                &self.config,
                &canonical_output,
                progress,
            ),
        }?;

        report.output_path.clone_from(output);
        report.bytes_compressed = fs::metadata(output)?.len();
        report.duration = start.elapsed();

        progress.on_complete();

        info!(
            output = %output.display(),
            entries = report.entries_added(),
            bytes = report.bytes_compressed,
            "archive written"
        );

        Ok(report)
    }
}

/// Packs `roots` into a new archive described by `config`.
///
/// # Errors
///
/// See [`Packer::create_with_progress`].
pub fn pack_directories<P: AsRef<Path>>(config: &PackConfig, roots: &[P]) -> Result<PackReport> {
    Packer::new(config.clone()).roots(roots).create()
}

/// Canonicalizes every include root, checking it is an existing directory.
fn resolve_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    roots
        .iter()
        .map(|root| {
            let canonical = fs::canonicalize(root).map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    PackError::SourceNotFound { path: root.clone() }
                } else {
                    PackError::Io(e)
                }
            })?;

            if !canonical.is_dir() {
                return Err(PackError::InvalidConfiguration {
                    reason: format!("include root is not a directory: {}", root.display()),
                });
            }

            Ok(canonical)
        })
        .collect()
}

/// Walks every root into `sink`, then finalizes it whatever the outcome.
///
/// A walk error takes precedence over a finalization error.
fn pack_into<S: ArchiveSink>(
    mut sink: S,
    rules: &ExclusionRules,
    roots: &[PathBuf],
    config: &PackConfig,
    output: &Path,
    progress: &mut dyn ProgressCallback,
) -> Result<PackReport> {
    let mut walker = TreeWalker::new(&mut sink, rules, progress)
        .with_symlink_policy(config.symlink_policy())
        .with_output_path(output)
        .with_verbose(config.verbose);

    let walked = roots.iter().try_for_each(|root| walker.walk_root(root));
    let report = walker.into_report();
    let finished = sink.finish();

    walked?;
    finished?;
    Ok(report)
}

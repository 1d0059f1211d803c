//! Configuration for packaging operations.

use crate::PackError;
use crate::Result;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

/// Default relpath prefixes excluded from every archive.
pub const DEFAULT_EXCLUDE_PREFIXES: &[&str] = &["."];

/// Default relpath suffixes excluded from every archive.
pub const DEFAULT_EXCLUDE_SUFFIXES: &[&str] = &[".go", ".DS_Store", ".tmp"];

/// Container format of the output archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar archive.
    #[default]
    TarGz,
    /// ZIP archive.
    Zip,
}

impl ArchiveFormat {
    /// File extension used when naming the archive, without leading dot.
    ///
    /// # Examples
    ///
    /// ```
    /// use apppack_core::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::TarGz.extension(), "tar.gz");
    /// assert_eq!(ArchiveFormat::Zip.extension(), "zip");
    /// ```
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    /// Builds the archive file name for an application.
    ///
    /// # Examples
    ///
    /// ```
    /// use apppack_core::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::Zip.archive_name("blog"), "blog.zip");
    /// ```
    #[must_use]
    pub fn archive_name(self, app_name: &str) -> String {
        format!("{app_name}.{}", self.extension())
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArchiveFormat {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "zip" => Ok(Self::Zip),
            other => Err(PackError::InvalidConfiguration {
                reason: format!("unsupported archive format `{other}` (expected tar.gz or zip)"),
            }),
        }
    }
}

/// How symbolic links found under an include root are archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymlinkPolicy {
    /// Store the link itself; the archive records the link target string.
    #[default]
    Store,
    /// Resolve the link and embed the target's content under the link's path.
    Follow,
    /// Omit symlinks entirely.
    Skip,
}

/// Configuration for a packaging run.
///
/// # Examples
///
/// ```
/// use apppack_core::ArchiveFormat;
/// use apppack_core::PackConfig;
///
/// let config = PackConfig::new("dist/blog.zip")
///     .with_format(ArchiveFormat::Zip)
///     .with_exclude_regexes(vec![r"^conf$".to_string()])
///     .with_skip_symlinks(true);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PackConfig {
    /// Path of the archive to create. Never included in its own content.
    pub output_path: PathBuf,

    /// Container format.
    ///
    /// Default: [`ArchiveFormat::TarGz`].
    pub format: ArchiveFormat,

    /// Virtual-path prefixes to exclude.
    ///
    /// Default: `["."]` (dotfiles and dot-directories).
    pub exclude_prefixes: Vec<String>,

    /// Virtual-path suffixes to exclude.
    ///
    /// Default: `[".go", ".DS_Store", ".tmp"]`.
    pub exclude_suffixes: Vec<String>,

    /// Regular expressions matched against entry basenames.
    ///
    /// Default: empty.
    pub exclude_regexes: Vec<String>,

    /// Resolve symlinks and archive their targets' content.
    pub follow_symlinks: bool,

    /// Leave symlinks out of the archive.
    pub skip_symlinks: bool,

    /// Report every compressed entry to the progress callback's notice hook.
    pub verbose: bool,

    /// Compression level (1-9). `None` uses the format default.
    pub compression_level: Option<u8>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::new(),
            format: ArchiveFormat::default(),
            exclude_prefixes: DEFAULT_EXCLUDE_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            exclude_suffixes: DEFAULT_EXCLUDE_SUFFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            exclude_regexes: Vec::new(),
            follow_symlinks: false,
            skip_symlinks: false,
            verbose: false,
            compression_level: None,
        }
    }
}

impl PackConfig {
    /// Creates a configuration writing to `output_path` with default rules.
    #[must_use]
    pub fn new<P: AsRef<Path>>(output_path: P) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Sets the output archive path.
    #[must_use]
    pub fn with_output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = path.as_ref().to_path_buf();
        self
    }

    /// Sets the archive format.
    #[must_use]
    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    /// Replaces the excluded prefixes.
    #[must_use]
    pub fn with_exclude_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.exclude_prefixes = prefixes;
        self
    }

    /// Replaces the excluded suffixes.
    #[must_use]
    pub fn with_exclude_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.exclude_suffixes = suffixes;
        self
    }

    /// Replaces the basename exclusion regexes.
    #[must_use]
    pub fn with_exclude_regexes(mut self, patterns: Vec<String>) -> Self {
        self.exclude_regexes = patterns;
        self
    }

    /// Sets whether to follow symlinks.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Sets whether to skip symlinks.
    #[must_use]
    pub fn with_skip_symlinks(mut self, skip: bool) -> Self {
        self.skip_symlinks = skip;
        self
    }

    /// Sets verbose per-entry notices.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets the compression level.
    ///
    /// # Panics
    ///
    /// Panics if the compression level is not in the range 1-9.
    /// Use `validate()` for non-panicking validation.
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        assert!((1..=9).contains(&level), "compression level must be 1-9");
        self.compression_level = Some(level);
        self
    }

    /// Returns the symlink policy selected by the two symlink flags.
    ///
    /// Skip wins if both are set; `validate()` rejects that combination.
    #[must_use]
    pub const fn symlink_policy(&self) -> SymlinkPolicy {
        if self.skip_symlinks {
            SymlinkPolicy::Skip
        } else if self.follow_symlinks {
            SymlinkPolicy::Follow
        } else {
            SymlinkPolicy::Store
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The output path is empty
    /// - Both follow and skip symlinks are set
    /// - Compression level is set but not in range 1-9
    /// - An exclusion regex does not compile
    pub fn validate(&self) -> Result<()> {
        if self.output_path.as_os_str().is_empty() {
            return Err(PackError::InvalidConfiguration {
                reason: "output path not set".to_string(),
            });
        }

        if self.follow_symlinks && self.skip_symlinks {
            return Err(PackError::InvalidConfiguration {
                reason: "follow and skip symlinks are mutually exclusive".to_string(),
            });
        }

        if let Some(level) = self.compression_level
            && !(1..=9).contains(&level)
        {
            return Err(PackError::InvalidConfiguration {
                reason: format!("compression level must be 1-9, got {level}"),
            });
        }

        for pattern in &self.exclude_regexes {
            regex::Regex::new(pattern).map_err(|source| PackError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_config_default() {
        let config = PackConfig::default();
        assert_eq!(config.output_path, PathBuf::new());
        assert_eq!(config.format, ArchiveFormat::TarGz);
        assert_eq!(config.exclude_prefixes, vec![".".to_string()]);
        assert_eq!(
            config.exclude_suffixes,
            vec![".go".to_string(), ".DS_Store".to_string(), ".tmp".to_string()]
        );
        assert!(config.exclude_regexes.is_empty());
        assert!(!config.follow_symlinks);
        assert!(!config.skip_symlinks);
        assert!(!config.verbose);
        assert_eq!(config.compression_level, None);
        assert_eq!(config.symlink_policy(), SymlinkPolicy::Store);
    }

    #[test]
    fn test_pack_config_builder() {
        let config = PackConfig::new("out.tar.gz")
            .with_output_path("dist/app.zip")
            .with_format(ArchiveFormat::Zip)
            .with_exclude_prefixes(vec!["tmp/".to_string()])
            .with_exclude_suffixes(vec![".log".to_string()])
            .with_exclude_regexes(vec!["^test_".to_string()])
            .with_follow_symlinks(true)
            .with_verbose(true)
            .with_compression_level(9);

        assert_eq!(config.output_path, PathBuf::from("dist/app.zip"));
        assert_eq!(config.format, ArchiveFormat::Zip);
        assert_eq!(config.exclude_prefixes, vec!["tmp/".to_string()]);
        assert_eq!(config.exclude_suffixes, vec![".log".to_string()]);
        assert_eq!(config.exclude_regexes, vec!["^test_".to_string()]);
        assert!(config.follow_symlinks);
        assert!(config.verbose);
        assert_eq!(config.compression_level, Some(9));
        assert_eq!(config.symlink_policy(), SymlinkPolicy::Follow);
    }

    #[test]
    fn test_validate_requires_output_path() {
        let result = PackConfig::default().validate();
        assert!(matches!(
            result.unwrap_err(),
            PackError::InvalidConfiguration { .. }
        ));
        assert!(PackConfig::new("a.tar.gz").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_follow_and_skip() {
        let config = PackConfig::new("a.tar.gz")
            .with_follow_symlinks(true)
            .with_skip_symlinks(true);
        assert_eq!(config.symlink_policy(), SymlinkPolicy::Skip);
        assert!(matches!(
            config.validate().unwrap_err(),
            PackError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let config = PackConfig::new("a.tar.gz")
            .with_exclude_regexes(vec!["ok".to_string(), "([unclosed".to_string()]);
        match config.validate().unwrap_err() {
            PackError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "([unclosed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_compression_level_out_of_range() {
        let config = PackConfig {
            compression_level: Some(0),
            ..PackConfig::new("a.zip")
        };
        assert!(config.validate().is_err());

        let config = PackConfig {
            compression_level: Some(10),
            ..PackConfig::new("a.zip")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[should_panic(expected = "compression level must be 1-9")]
    fn test_builder_invalid_compression() {
        let _config = PackConfig::default().with_compression_level(0);
    }

    #[test]
    fn test_archive_format_parse() {
        assert_eq!("tar.gz".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarGz);
        assert_eq!("TGZ".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarGz);
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert!("rar".parse::<ArchiveFormat>().is_err());
    }

    #[test]
    fn test_archive_format_naming() {
        assert_eq!(ArchiveFormat::TarGz.to_string(), "tar.gz");
        assert_eq!(ArchiveFormat::TarGz.archive_name("blog"), "blog.tar.gz");
        assert_eq!(ArchiveFormat::Zip.archive_name("blog"), "blog.zip");
    }
}

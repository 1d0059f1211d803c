//! Project signature detection.
//!
//! A directory is packageable when one of its immediate source files
//! matches a content signature. By default that is a Go `main` package that
//! declares `func main()`.

use crate::PackError;
use crate::Result;
use regex::bytes::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default source file extension, without leading dot.
pub const DEFAULT_SOURCE_EXTENSION: &str = "go";

/// Default signature matched against source file content.
pub const DEFAULT_SIGNATURE: &str = r"(?s)package main.*?func main\s*\(\)";

/// Content signature identifying a packageable application directory.
///
/// # Examples
///
/// ```no_run
/// use apppack_core::project::ProjectSignature;
/// use std::path::Path;
///
/// let signature = ProjectSignature::go()?;
/// if signature.matches(Path::new("/home/me/blog")) {
///     println!("looks like an application");
/// }
/// # Ok::<(), apppack_core::PackError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProjectSignature {
    extension: String,
    pattern: Regex,
}

impl ProjectSignature {
    /// Signature of a Go `main` package in `.go` files.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPattern`] if the built-in pattern does not
    /// compile.
    pub fn go() -> Result<Self> {
        Self::new(DEFAULT_SOURCE_EXTENSION, DEFAULT_SIGNATURE)
    }

    /// Creates a signature for files ending in `.{extension}` whose content
    /// matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPattern`] if `pattern` does not compile.
    pub fn new(extension: impl Into<String>, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| PackError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            extension: extension.into().trim_start_matches('.').to_string(),
            pattern,
        })
    }

    /// Returns `true` if any immediate source file of `dir` matches.
    ///
    /// Subdirectories are not searched. Unreadable files are ignored.
    #[must_use]
    pub fn matches(&self, dir: &Path) -> bool {
        let Ok(entries) = fs::read_dir(dir) else {
            return false;
        };

        let suffix = format!(".{}", self.extension);

        entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| !t.is_dir()))
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(&suffix))
            .any(|entry| match fs::read(entry.path()) {
                Ok(data) => {
                    let found = self.pattern.is_match(&data);
                    if found {
                        debug!(file = %entry.path().display(), "project signature found");
                    }
                    found
                }
                Err(e) => {
                    debug!(file = %entry.path().display(), error = %e, "unreadable source file");
                    false
                }
            })
    }

    /// Fails unless `dir` matches the signature.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::NotPackageable`] if no source file matches.
    pub fn ensure(&self, dir: &Path) -> Result<()> {
        if self.matches(dir) {
            Ok(())
        } else {
            Err(PackError::NotPackageable {
                path: dir.to_path_buf(),
            })
        }
    }
}

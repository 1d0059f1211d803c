//! Error types for packaging operations.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias using `PackError`.
pub type Result<T> = std::result::Result<T, PackError>;

/// Errors that can occur while packaging an application.
#[derive(Error, Debug)]
pub enum PackError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An include root or application path does not exist.
    #[error("source not found: {path}")]
    SourceNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An exclusion regular expression failed to compile.
    #[error("invalid exclude pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending pattern as supplied.
        pattern: String,
        /// Compilation error reported by the regex engine.
        #[source]
        source: regex::Error,
    },

    /// Configuration is inconsistent or incomplete.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The directory does not carry the expected project signature.
    #[error("not a packageable project: {path}")]
    NotPackageable {
        /// The directory that was checked.
        path: PathBuf,
    },

    /// The external build command exited unsuccessfully.
    #[error("build command `{program}` failed: {status}")]
    BuildFailed {
        /// Program that was run.
        program: String,
        /// Exit status reported by the process.
        status: ExitStatus,
    },

    /// Directory-level request to skip the remainder of a subtree.
    ///
    /// Absorbed by the parent directory's iteration and never returned from
    /// a completed walk.
    #[error("skip subtree: {path}")]
    SkipSubtree {
        /// Directory whose subtree is skipped.
        path: PathBuf,
    },
}

impl PackError {
    /// Returns `true` for the structural skip-subtree sentinel.
    ///
    /// # Examples
    ///
    /// ```
    /// use apppack_core::PackError;
    /// use std::path::PathBuf;
    ///
    /// let err = PackError::SkipSubtree {
    ///     path: PathBuf::from("static"),
    /// };
    /// assert!(err.is_skip_subtree());
    /// ```
    #[must_use]
    pub const fn is_skip_subtree(&self) -> bool {
        matches!(self, Self::SkipSubtree { .. })
    }

    /// Returns `true` if the error was raised before any archive content
    /// could be written.
    ///
    /// # Examples
    ///
    /// ```
    /// use apppack_core::PackError;
    ///
    /// let err = PackError::InvalidConfiguration {
    ///     reason: "follow and skip symlinks are mutually exclusive".to_string(),
    /// };
    /// assert!(err.is_configuration_error());
    ///
    /// let err = PackError::Io(std::io::Error::other("disk full"));
    /// assert!(!err.is_configuration_error());
    /// ```
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidConfiguration { .. }
                | Self::NotPackageable { .. }
        )
    }
}

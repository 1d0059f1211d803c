//! Error conversion utilities for CLI.
//!
//! Converts apppack-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use apppack_core::PackError;
use std::io;
use std::path::Path;

/// Converts `PackError` to user-friendly anyhow error with context
pub fn convert_pack_error(err: PackError, app: &Path) -> anyhow::Error {
    match err {
        PackError::SourceNotFound { path } => {
            anyhow!(
                "Path not found: {}\n\
                 HINT: Use --path to point at the application directory.",
                path.display()
            )
        }
        PackError::NotPackageable { path } => {
            anyhow!(
                "'{}' is not a packageable application: no .go file declares a main package with func main()\n\
                 HINT: Run apppack from the application root or pass --path.",
                path.display()
            )
        }
        PackError::InvalidPattern { pattern, source } => {
            anyhow!(
                "Invalid --exclude-regex pattern '{pattern}': {source}\n\
                 HINT: Patterns are matched against file names, not paths."
            )
        }
        PackError::InvalidConfiguration { reason } => {
            anyhow!("Invalid configuration: {reason}")
        }
        PackError::BuildFailed { program, status } => {
            anyhow!(
                "Build of '{}' failed: `{program} build` {status}\n\
                 HINT: Fix the errors reported above, or use --no-build to pack the sources only.",
                app.display()
            )
        }
        PackError::Io(io_err) => {
            anyhow!(
                "I/O error while packaging '{}': {}",
                app.display(),
                io_err
            )
        }
        _ => anyhow::Error::from(err)
            .context(format!("Error packaging '{}'", app.display())),
    }
}

/// Converts an error from the build step.
///
/// A missing build program gets its own hint, everything else goes through
/// [`convert_pack_error`].
pub fn convert_build_error(err: PackError, app: &Path) -> anyhow::Error {
    match err {
        PackError::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            anyhow!(
                "Could not start the build for '{}': {}\n\
                 HINT: Install the Go toolchain, or use --no-build to pack the sources only.",
                app.display(),
                io_err
            )
        }
        other => convert_pack_error(other, app),
    }
}

/// Adds context to a packaging result
pub fn add_pack_context<T>(result: Result<T, PackError>, app: &Path) -> anyhow::Result<T> {
    result.map_err(|e| convert_pack_error(e, app))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use apppack_core::creation::filters::ExclusionRules;
    use std::path::PathBuf;

    #[test]
    fn test_convert_not_packageable_error() {
        let err = PackError::NotPackageable {
            path: PathBuf::from("/srv/notes"),
        };
        let converted = convert_pack_error(err, Path::new("/srv/notes"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("not a packageable application"));
        assert!(msg.contains("/srv/notes"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_invalid_pattern_error() {
        let err = ExclusionRules::compile(vec![], vec![], &["[".to_string()]).unwrap_err();
        let converted = convert_pack_error(err, Path::new("blog"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("--exclude-regex"));
        assert!(msg.contains("'['"));
    }

    #[test]
    fn test_convert_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let converted = convert_pack_error(PackError::Io(io_err), Path::new("blog"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("blog"));
    }

    #[test]
    fn test_convert_build_error_missing_program() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "failed to run `go`");
        let converted = convert_build_error(PackError::Io(io_err), Path::new("blog"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("Install the Go toolchain"));
        assert!(msg.contains("--no-build"));
    }

    #[test]
    fn test_convert_build_error_delegates() {
        let err = PackError::InvalidConfiguration {
            reason: "no include roots".to_string(),
        };
        let converted = convert_build_error(err, Path::new("blog"));
        assert_eq!(
            converted.to_string(),
            "Invalid configuration: no include roots"
        );
    }

    #[test]
    fn test_add_pack_context() {
        let result: Result<(), PackError> = Err(PackError::SourceNotFound {
            path: PathBuf::from("missing"),
        });
        let err = add_pack_context(result, Path::new("blog")).unwrap_err();
        assert!(err.to_string().contains("Path not found: missing"));
    }
}

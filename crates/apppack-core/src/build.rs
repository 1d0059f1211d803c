//! External build step producing the application binary.
//!
//! Runs `go build -o <tmp>/<app>` inside the application directory so the
//! freshly built binary can be packed as an extra include root ahead of the
//! sources.

use crate::PackError;
use crate::Result;
use std::env;
use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;
use tracing::info;

/// Target platform, in Go's `GOOS`/`GOARCH` vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Operating system (`linux`, `darwin`, `windows`, ...).
    pub os: String,
    /// Architecture (`amd64`, `arm64`, `386`, ...).
    pub arch: String,
}

impl BuildTarget {
    /// Creates a target from explicit names.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this program runs on.
    #[must_use]
    pub fn host() -> Self {
        Self::new(go_os(env::consts::OS), go_arch(env::consts::ARCH))
    }

    /// The host platform, overridden by the `GOOS` and `GOARCH` environment
    /// variables when set.
    #[must_use]
    pub fn from_env() -> Self {
        let mut target = Self::host();
        if let Ok(os) = env::var("GOOS")
            && !os.is_empty()
        {
            target.os = os;
        }
        if let Ok(arch) = env::var("GOARCH")
            && !arch.is_empty()
        {
            target.arch = arch;
        }
        target
    }

    /// File name of the binary built for this target.
    ///
    /// # Examples
    ///
    /// ```
    /// use apppack_core::build::BuildTarget;
    ///
    /// assert_eq!(BuildTarget::new("linux", "amd64").binary_name("blog"), "blog");
    /// assert_eq!(BuildTarget::new("windows", "amd64").binary_name("blog"), "blog.exe");
    /// ```
    #[must_use]
    pub fn binary_name(&self, app_name: &str) -> String {
        if self.os == "windows" {
            format!("{app_name}.exe")
        } else {
            app_name.to_string()
        }
    }
}

fn go_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn go_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

/// Parses a `KEY=VALUE` build environment assignment.
///
/// Whitespace around key and value is trimmed; both must be non-empty.
///
/// # Errors
///
/// Returns [`PackError::InvalidConfiguration`] for malformed input.
///
/// # Examples
///
/// ```
/// use apppack_core::build::parse_build_env;
///
/// assert_eq!(
///     parse_build_env(" GOARCH = arm ")?,
///     ("GOARCH".to_string(), "arm".to_string())
/// );
/// assert!(parse_build_env("CGO_ENABLED").is_err());
/// # Ok::<(), apppack_core::PackError>(())
/// ```
pub fn parse_build_env(assignment: &str) -> Result<(String, String)> {
    let invalid = || PackError::InvalidConfiguration {
        reason: format!("build environment must be KEY=VALUE, got `{assignment}`"),
    };

    let (key, value) = assignment.split_once('=').ok_or_else(invalid)?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(invalid());
    }

    Ok((key.to_string(), value.to_string()))
}

/// Builds an application binary into a scoped temporary directory.
///
/// # Examples
///
/// ```no_run
/// use apppack_core::build::BuildStep;
///
/// let output = BuildStep::new("/home/me/blog")
///     .with_build_envs(vec![("GOOS".into(), "linux".into())])
///     .with_build_args("-ldflags -s")
///     .run()?;
///
/// println!("built {}", output.binary().display());
/// # Ok::<(), apppack_core::PackError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BuildStep {
    program: String,
    app_dir: PathBuf,
    target: BuildTarget,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl BuildStep {
    /// Creates a `go build` step for `app_dir`, targeting [`BuildTarget::from_env`].
    #[must_use]
    pub fn new<P: AsRef<Path>>(app_dir: P) -> Self {
        Self {
            program: "go".to_string(),
            app_dir: app_dir.as_ref().to_path_buf(),
            target: BuildTarget::from_env(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Replaces the build program.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the target platform.
    #[must_use]
    pub fn with_target(mut self, target: BuildTarget) -> Self {
        self.target = target;
        self
    }

    /// Adds build environment assignments.
    ///
    /// `GOOS` and `GOARCH` change the target; every other pair is passed to
    /// the build process as is.
    #[must_use]
    pub fn with_build_envs(mut self, envs: Vec<(String, String)>) -> Self {
        for (key, value) in envs {
            match key.as_str() {
                "GOOS" => self.target.os = value,
                "GOARCH" => self.target.arch = value,
                _ => self.envs.push((key, value)),
            }
        }
        self
    }

    /// Appends whitespace-separated extra arguments for the build program.
    #[must_use]
    pub fn with_build_args(mut self, args: &str) -> Self {
        self.args
            .extend(args.split_whitespace().map(ToString::to_string));
        self
    }

    /// Target platform of the build.
    #[must_use]
    pub const fn target(&self) -> &BuildTarget {
        &self.target
    }

    /// Name of the application, taken from its directory name.
    #[must_use]
    pub fn app_name(&self) -> String {
        self.app_dir
            .file_name()
            .map_or_else(|| "app".to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// The command that builds the binary at `binary`.
    #[must_use]
    pub fn command(&self, binary: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("build")
            .arg("-o")
            .arg(binary)
            .args(&self.args)
            .current_dir(&self.app_dir)
            .env("GOOS", &self.target.os)
            .env("GOARCH", &self.target.arch)
            .envs(self.envs.iter().map(|(k, v)| (OsStr::new(k), OsStr::new(v))));
        cmd
    }

    /// Runs the build.
    ///
    /// Build output goes straight to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created, the
    /// program cannot be started, or [`PackError::BuildFailed`] if it exits
    /// unsuccessfully.
    pub fn run(&self) -> Result<BuildOutput> {
        let dir = tempfile::Builder::new().prefix("apppack-").tempdir()?;
        let binary = dir.path().join(self.target.binary_name(&self.app_name()));

        info!(
            goos = %self.target.os,
            goarch = %self.target.arch,
            "building application"
        );

        let mut cmd = self.command(&binary);
        debug!(command = ?cmd, "running build");

        let status = cmd.status().map_err(|e| {
            PackError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to run `{}`: {e}", self.program),
            ))
        })?;

        if !status.success() {
            return Err(PackError::BuildFailed {
                program: self.program.clone(),
                status,
            });
        }

        info!(binary = %binary.display(), "build successful");
        Ok(BuildOutput { dir, binary })
    }
}

/// Result of a successful build. The directory is removed on drop.
#[derive(Debug)]
pub struct BuildOutput {
    dir: TempDir,
    binary: PathBuf,
}

impl BuildOutput {
    /// Directory holding the binary, used as an include root.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the built binary.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_go_names() {
        assert_eq!(go_os("macos"), "darwin");
        assert_eq!(go_os("linux"), "linux");
        assert_eq!(go_arch("x86_64"), "amd64");
        assert_eq!(go_arch("aarch64"), "arm64");
        assert_eq!(go_arch("x86"), "386");
        assert_eq!(go_arch("riscv64"), "riscv64");
    }

    #[test]
    fn test_parse_build_env() {
        assert_eq!(
            parse_build_env("CGO_ENABLED=0").unwrap(),
            ("CGO_ENABLED".to_string(), "0".to_string())
        );
        assert_eq!(
            parse_build_env("LDFLAGS=-X a=b").unwrap(),
            ("LDFLAGS".to_string(), "-X a=b".to_string())
        );
        assert!(parse_build_env("=x").is_err());
        assert!(parse_build_env("KEY=").is_err());
        assert!(parse_build_env("KEY= ").is_err());
    }

    #[test]
    fn test_build_envs_override_target() {
        let step = BuildStep::new("/srv/blog")
            .with_target(BuildTarget::new("linux", "amd64"))
            .with_build_envs(vec![
                ("GOARCH".into(), "arm".into()),
                ("CGO_ENABLED".into(), "0".into()),
            ]);

        assert_eq!(step.target(), &BuildTarget::new("linux", "arm"));
        assert_eq!(step.envs, vec![("CGO_ENABLED".to_string(), "0".to_string())]);
    }

    #[test]
    fn test_command_shape() {
        let step = BuildStep::new("/srv/blog")
            .with_target(BuildTarget::new("windows", "386"))
            .with_build_args("  -v   -ldflags=-s ")
            .with_build_envs(vec![("CGO_ENABLED".into(), "0".into())]);

        let cmd = step.command(Path::new("/tmp/out/blog.exe"));

        assert_eq!(cmd.get_program(), "go");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["build", "-o", "/tmp/out/blog.exe", "-v", "-ldflags=-s"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/srv/blog")));

        let envs: Vec<_> = cmd.get_envs().collect();
        assert!(envs.contains(&(OsStr::new("GOOS"), Some(OsStr::new("windows")))));
        assert!(envs.contains(&(OsStr::new("GOARCH"), Some(OsStr::new("386")))));
        assert!(envs.contains(&(OsStr::new("CGO_ENABLED"), Some(OsStr::new("0")))));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(BuildStep::new("/srv/blog").app_name(), "blog");
        assert_eq!(BuildStep::new("/").app_name(), "app");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_success_keeps_dir_until_drop() {
        let app = tempfile::TempDir::new().unwrap();
        let output = BuildStep::new(app.path())
            .with_program("true")
            .with_target(BuildTarget::new("linux", "amd64"))
            .run()
            .unwrap();

        let dir = output.dir().to_path_buf();
        assert!(dir.is_dir());
        assert_eq!(output.binary().parent(), Some(dir.as_path()));
        drop(output);
        assert!(!dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failure() {
        let app = tempfile::TempDir::new().unwrap();
        let err = BuildStep::new(app.path())
            .with_program("false")
            .run()
            .unwrap_err();

        assert!(matches!(err, PackError::BuildFailed { ref program, .. } if program == "false"));
    }

    #[test]
    fn test_run_missing_program() {
        let app = tempfile::TempDir::new().unwrap();
        let err = BuildStep::new(app.path())
            .with_program("apppack-no-such-compiler")
            .run()
            .unwrap_err();

        assert!(matches!(err, PackError::Io(_)));
    }
}

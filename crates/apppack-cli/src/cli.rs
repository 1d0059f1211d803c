//! CLI argument parsing using clap.

use apppack_core::ArchiveFormat;
use apppack_core::build::parse_build_env;
use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "apppack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build an application and pack it into a deployable archive
    Pack(PackArgs),
    /// Generate shell completion scripts
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct PackArgs {
    /// Application directory to package (default: current directory)
    #[arg(short = 'p', long = "path", value_name = "DIR")]
    pub app_path: Option<PathBuf>,

    /// Build the application binary before packing
    #[arg(
        short = 'b',
        long = "build",
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub build: bool,

    /// Skip the build step and pack the sources only
    #[arg(long = "no-build", conflicts_with = "build")]
    pub no_build: bool,

    /// Extra arguments passed to `go build`
    #[arg(
        long = "build-args",
        value_name = "ARGS",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub build_args: String,

    /// Build environment variable as KEY=VALUE (can be repeated)
    ///
    /// GOOS and GOARCH select the target platform.
    #[arg(long = "build-env", value_name = "KEY=VALUE", value_parser = parse_env_assignment)]
    pub build_envs: Vec<(String, String)>,

    /// Directory the archive is written to (default: current directory)
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Archive format
    #[arg(short = 'f', long, value_enum, default_value_t = FormatArg::TarGz)]
    pub format: FormatArg,

    /// Relpath prefixes to exclude, separated by ':'
    #[arg(long = "exclude-prefix", value_name = "LIST", default_value = ".")]
    pub exclude_prefix: String,

    /// Relpath suffixes to exclude, separated by ':'
    #[arg(
        long = "exclude-suffix",
        value_name = "LIST",
        default_value = ".go:.DS_Store:.tmp"
    )]
    pub exclude_suffix: String,

    /// File name regex to exclude (can be repeated)
    #[arg(long = "exclude-regex", value_name = "REGEX")]
    pub exclude_regex: Vec<String>,

    /// Follow symbolic links and archive their targets
    #[arg(long, alias = "fs", conflicts_with = "skip_symlinks")]
    pub follow_symlinks: bool,

    /// Leave symbolic links out of the archive
    #[arg(long, alias = "ss")]
    pub skip_symlinks: bool,

    /// Compression level (1-9)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub compression_level: Option<u8>,
}

impl PackArgs {
    /// Whether the build step runs.
    pub const fn should_build(&self) -> bool {
        self.build && !self.no_build
    }
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Archive format accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Gzip-compressed tar archive
    #[value(name = "tar.gz", alias = "tgz")]
    TarGz,
    /// ZIP archive
    Zip,
}

impl From<FormatArg> for ArchiveFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::TarGz => Self::TarGz,
            FormatArg::Zip => Self::Zip,
        }
    }
}

fn parse_env_assignment(s: &str) -> Result<(String, String), String> {
    parse_build_env(s).map_err(|e| e.to_string())
}

/// Splits a ':'-separated list, dropping empty segments.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(':')
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

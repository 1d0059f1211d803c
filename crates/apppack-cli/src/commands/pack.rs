//! Pack command implementation.

use crate::cli::Cli;
use crate::cli::PackArgs;
use crate::cli::split_list;
use crate::error::add_pack_context;
use crate::error::convert_build_error;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use apppack_core::ArchiveFormat;
use apppack_core::PackConfig;
use apppack_core::Packer;
use apppack_core::build::BuildOutput;
use apppack_core::build::BuildStep;
use apppack_core::project::ProjectSignature;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;

pub fn execute(args: &PackArgs, formatter: &dyn OutputFormatter, cli: &Cli) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let app_path = resolve_app_path(args.app_path.as_deref(), &cwd)?;

    let signature = add_pack_context(ProjectSignature::go(), &app_path)?;
    add_pack_context(signature.ensure(&app_path), &app_path)?;

    let app_name = app_name(&app_path);
    formatter.format_step(&format!("Packaging application: {}", app_path.display()));

    // Kept alive until packing finishes; dropping it removes the build dir.
    let build = if args.should_build() {
        formatter.format_step("Building application...");
        Some(run_build(args, &app_path)?)
    } else {
        None
    };

    let output_dir = args
        .output_dir
        .as_ref()
        .map_or_else(|| cwd.clone(), |dir| cwd.join(dir));
    fs::create_dir_all(&output_dir).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            output_dir.display()
        )
    })?;

    let format = ArchiveFormat::from(args.format);
    let output_path = output_dir.join(format.archive_name(&app_name));
    let config = pack_config(args, cli.verbose, format, &output_path);

    let mut packer = Packer::new(config);
    if let Some(build) = &build {
        packer = packer.add_root(build.dir());
    }
    packer = packer.add_root(&app_path);

    formatter.format_step(&format!("Writing {}", output_path.display()));

    let spinner = !cli.quiet && !cli.json && !cli.verbose && CliProgress::should_show();
    let notices = cli.verbose && !cli.json;
    let mut progress = CliProgress::new(spinner, notices);
    let report = add_pack_context(packer.create_with_progress(&mut progress), &app_path)?;
    drop(progress);
    drop(build);

    info!(
        entries = report.entries_added(),
        output = %report.output_path.display(),
        "application packaged"
    );

    formatter.format_pack_result(&report)?;

    Ok(())
}

fn resolve_app_path(requested: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let path = requested.map_or_else(|| cwd.to_path_buf(), |p| cwd.join(p));

    let resolved = match fs::canonicalize(&path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            bail!(
                "Application path not found: {}\n\
                 HINT: Use --path to point at the application directory.",
                path.display()
            )
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to resolve '{}'", path.display()));
        }
    };

    if !resolved.is_dir() {
        bail!(
            "Application path is not a directory: {}",
            resolved.display()
        );
    }

    Ok(resolved)
}

fn app_name(app_path: &Path) -> String {
    app_path
        .file_name()
        .map_or_else(|| "app".to_string(), |n| n.to_string_lossy().into_owned())
}

fn run_build(args: &PackArgs, app_path: &Path) -> Result<BuildOutput> {
    BuildStep::new(app_path)
        .with_build_envs(args.build_envs.clone())
        .with_build_args(&args.build_args)
        .run()
        .map_err(|e| convert_build_error(e, app_path))
}

fn pack_config(
    args: &PackArgs,
    verbose: bool,
    format: ArchiveFormat,
    output_path: &Path,
) -> PackConfig {
    let mut config = PackConfig::new(output_path)
        .with_format(format)
        .with_exclude_prefixes(split_list(&args.exclude_prefix))
        .with_exclude_suffixes(split_list(&args.exclude_suffix))
        .with_exclude_regexes(args.exclude_regex.clone())
        .with_follow_symlinks(args.follow_symlinks)
        .with_skip_symlinks(args.skip_symlinks)
        .with_verbose(verbose);

    if let Some(level) = args.compression_level {
        config = config.with_compression_level(level);
    }

    config
}

//! Command-line surface of the `dts-screen` binary

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use dts_screen_core::{BackendKind, OutputLine, ScreenOutcome, ScreenRequest, run_screen};

use crate::config::{ScreenConfig, parse_resources};

#[derive(Parser, Debug)]
#[command(name = "dts-screen")]
#[command(about = "Run a parameter screen over a templated DTS input file")]
pub struct Args {
    /// Template input file with <<name:definition>> parameters
    #[arg(long = "in", value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Directory receiving the run directories, summary and workflow
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Execution backend
    #[arg(long, default_value_t = BackendKind::Snakemake)]
    pub backend: BackendKind,

    /// Extra arguments for the workflow driver (e.g. "-j 8 --keep-going")
    #[arg(long, allow_hyphen_values = true)]
    pub backend_args: Option<String>,

    /// Extra arguments for every engine invocation (e.g. "-top top.top -nt 4")
    #[arg(long, allow_hyphen_values = true)]
    pub dts_args: Option<String>,

    /// Per-run resources as KEY=VALUE pairs separated by commas
    #[arg(long, value_name = "KEY=VALUE,...")]
    pub resources: Option<String>,

    /// Set up runs and write the workflow without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Remove completion markers left by a previous screen before running
    #[arg(long)]
    pub invalidate_markers: bool,

    /// Path to a config file (default: ~/.dts_screen/config.yaml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Accept the engine's single-dash `-in` spelling for the template flag.
///
/// A `-in` that is the value of `--backend-args` or `--dts-args` is left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut normalized: Vec<OsString> = Vec::new();
    for arg in args {
        let is_value = normalized
            .last()
            .is_some_and(|prev| prev == "--backend-args" || prev == "--dts-args");
        let rewritten = match arg.to_str() {
            Some("-in") if !is_value => OsString::from("--in"),
            Some(s) if !is_value && s.starts_with("-in=") => OsString::from(format!("-{s}")),
            _ => arg,
        };
        normalized.push(rewritten);
    }
    normalized
}

impl Args {
    /// Merge command-line flags over the config into a screen request
    pub fn into_request(self, config: &ScreenConfig) -> color_eyre::Result<ScreenRequest> {
        let template = std::path::absolute(&self.template)
            .wrap_err_with(|| format!("Invalid template path {}", self.template.display()))?;
        let output_dir = std::path::absolute(&self.output_dir)
            .wrap_err_with(|| format!("Invalid output path {}", self.output_dir.display()))?;

        let mut resources = config.resources();
        if let Some(spec) = &self.resources {
            resources.extend(parse_resources(spec));
        }

        let mut request = ScreenRequest::new(template, output_dir);
        request.backend = self.backend;
        request.options = config.backend_options();
        request.engine_args = self
            .dts_args
            .or_else(|| config.dts_args.clone())
            .unwrap_or_default();
        request.backend_args = self
            .backend_args
            .or_else(|| config.backend_args.clone())
            .unwrap_or_default();
        request.resources = resources;
        request.dry_run = self.dry_run;
        request.invalidate_markers = self.invalidate_markers;
        Ok(request)
    }
}

/// Run the screen described by `args`, returning the process exit code
pub fn run(args: Args) -> color_eyre::Result<i32> {
    let config = ScreenConfig::resolve(args.config.as_deref())?;
    let request = args.into_request(&config)?;

    tracing::info!(
        template = %request.template_file.display(),
        output_dir = %request.output_dir.display(),
        backend = %request.backend,
        dry_run = request.dry_run,
        "starting parameter screen"
    );

    let outcome = run_screen(&request, &mut |line| match line {
        OutputLine::Stdout(text) => println!("{text}"),
        OutputLine::Stderr(text) => eprintln!("{text}"),
    })?;

    match &outcome {
        ScreenOutcome::DryRun {
            summary_path,
            artifact,
        } => {
            tracing::info!(
                summary = %summary_path.display(),
                workflow = %artifact.path.display(),
                jobs = artifact.jobs,
                "dry run complete"
            );
        }
        ScreenOutcome::Executed { status, progress } => {
            if status.success() {
                tracing::info!(completed = progress.completed, "screen completed");
            } else {
                tracing::error!(
                    code = ?status.code(),
                    completed = progress.completed,
                    failed = progress.failed.len(),
                    total = progress.total,
                    "workflow driver failed"
                );
            }
        }
    }

    Ok(outcome.exit_code())
}

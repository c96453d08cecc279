//! Execution backends
//!
//! A backend turns the runs of a screen summary into a workflow artifact for
//! some external driver and then runs that driver to completion. Backends are
//! selected with [`BackendKind`].
//!
//! # Example
//!
//! ```ignore
//! use dts_screen_core::backend::{BackendKind, BackendOptions, Resources};
//!
//! let backend = BackendKind::Snakemake.create(&BackendOptions::default())?;
//! let artifact = backend.generate_workflow(&summary.runs, &output_dir, "-nt 4", &Resources::new())?;
//! let status = backend.execute(&artifact, "-j 8", &mut |line| println!("{}", line.text()))?;
//! ```

mod process;
mod snakefile;
mod snakemake;
mod workflow;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::str::FromStr;

use crate::error::Result;
use crate::summary::RunRecord;

pub use process::{OutputLine, run_streaming};
pub use snakefile::{SNAKEFILE, render as render_snakefile};
pub use snakemake::SnakemakeBackend;
pub use workflow::{EngineArgs, Job, Resources, ShellProcedure, Workflow, shell_quote};

/// Capability interface every execution backend implements
pub trait Backend {
    /// Short name used in logs and on the command line
    fn name(&self) -> &'static str;

    /// Write the workflow for `runs` into `output_dir`
    fn generate_workflow(
        &self,
        runs: &[RunRecord],
        output_dir: &Path,
        engine_args: &str,
        resources: &Resources,
    ) -> Result<WorkflowArtifact>;

    /// Run the driver on a generated workflow, forwarding its output to `sink`.
    ///
    /// A non-zero status means at least one run failed.
    fn execute(
        &self,
        artifact: &WorkflowArtifact,
        backend_args: &str,
        sink: &mut dyn FnMut(OutputLine),
    ) -> Result<ExitStatus>;
}

/// A generated workflow file and where the driver must run it from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowArtifact {
    pub path: PathBuf,
    pub working_dir: PathBuf,
    pub jobs: usize,
}

/// Commands and conventions shared by backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    /// Engine executable invoked inside each run directory
    pub engine: String,
    /// Driver command, possibly with leading words (`conda run -n smk snakemake`)
    pub driver: String,
    /// Glob whose presence in a run directory marks the run as successful
    pub result_pattern: String,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            engine: "dts".to_string(),
            driver: "snakemake".to_string(),
            result_pattern: "*.res".to_string(),
        }
    }
}

/// Built-in backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Snakemake,
}

impl BackendKind {
    pub const ALL: &'static [BackendKind] = &[BackendKind::Snakemake];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Snakemake => "snakemake",
        }
    }

    /// Construct the backend, failing fast if its driver is not available
    pub fn create(self, options: &BackendOptions) -> Result<Box<dyn Backend>> {
        match self {
            BackendKind::Snakemake => Ok(Box::new(SnakemakeBackend::new(options)?)),
        }
    }

    /// Construct the backend without probing its driver
    pub fn create_unchecked(self, options: &BackendOptions) -> Box<dyn Backend> {
        match self {
            BackendKind::Snakemake => Box::new(SnakemakeBackend::unchecked(options)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BackendKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = BackendKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown backend '{s}' (available: {})", names.join(", "))
            })
    }
}

//! Snakemake execution backend

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::{Result, ScreenError};
use crate::summary::RunRecord;

use super::process::{OutputLine, run_streaming};
use super::snakefile::{self, SNAKEFILE};
use super::workflow::{EngineArgs, Resources, Workflow, split_args};
use super::{Backend, BackendOptions, WorkflowArtifact};

const INSTALL_HINT: &str = "Install with: pip install snakemake";

/// Drives a sweep through a generated Snakefile
#[derive(Debug, Clone)]
pub struct SnakemakeBackend {
    /// Driver program followed by any leading arguments, shell-quoted
    driver: String,
    engine: String,
    result_pattern: String,
}

impl SnakemakeBackend {
    /// Create the backend after checking that the driver can be invoked
    pub fn new(options: &BackendOptions) -> Result<Self> {
        let backend = Self::unchecked(options);
        backend.check_available()?;
        Ok(backend)
    }

    /// Create the backend without probing the driver
    pub fn unchecked(options: &BackendOptions) -> Self {
        Self {
            driver: options.driver.trim().to_string(),
            engine: options.engine.clone(),
            result_pattern: options.result_pattern.clone(),
        }
    }

    fn driver_command(&self) -> Result<Command> {
        let words = split_args(&self.driver)?;
        let Some((program, leading)) = words.split_first() else {
            return Err(self.unavailable("empty driver command".to_string()));
        };
        let mut command = Command::new(program);
        command.args(leading);
        Ok(command)
    }

    fn unavailable(&self, detail: String) -> ScreenError {
        ScreenError::BackendUnavailable {
            driver: self.driver.clone(),
            hint: INSTALL_HINT,
            detail,
        }
    }

    /// Run `<driver> --version` and fail unless it succeeds
    pub fn check_available(&self) -> Result<()> {
        let mut command = self.driver_command()?;
        let status = command
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !status.success() {
            return Err(self.unavailable(format!("`--version` exited with {status}")));
        }
        tracing::debug!(driver = %self.driver, "backend driver available");
        Ok(())
    }
}

impl Backend for SnakemakeBackend {
    fn name(&self) -> &'static str {
        "snakemake"
    }

    fn generate_workflow(
        &self,
        runs: &[RunRecord],
        output_dir: &Path,
        engine_args: &str,
        resources: &Resources,
    ) -> Result<WorkflowArtifact> {
        let engine_args = EngineArgs::parse(engine_args)?;
        let workflow = Workflow::build(
            runs.iter().map(|run| &run.run_id),
            &self.engine,
            &engine_args,
            &self.result_pattern,
            resources,
        );
        let path = snakefile::write(&workflow, output_dir)?;

        tracing::info!(
            path = %path.display(),
            jobs = workflow.jobs.len(),
            threads = engine_args.threads,
            "generated workflow"
        );
        Ok(WorkflowArtifact {
            path,
            working_dir: output_dir.to_path_buf(),
            jobs: workflow.jobs.len(),
        })
    }

    fn execute(
        &self,
        artifact: &WorkflowArtifact,
        backend_args: &str,
        sink: &mut dyn FnMut(OutputLine),
    ) -> Result<ExitStatus> {
        let workflow_file = artifact
            .path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SNAKEFILE));

        let mut command = self.driver_command()?;
        command
            .arg("-s")
            .arg(&workflow_file)
            .args(split_args(backend_args)?)
            .current_dir(&artifact.working_dir);

        tracing::info!(
            driver = %self.driver,
            backend_args,
            working_dir = %artifact.working_dir.display(),
            "launching workflow driver"
        );
        let status = run_streaming(command, sink)
            .map_err(|e| ScreenError::io(&artifact.working_dir, e))?;

        if status.success() {
            tracing::info!("workflow driver finished");
        } else {
            tracing::warn!(%status, "workflow driver reported failure");
        }
        Ok(status)
    }
}

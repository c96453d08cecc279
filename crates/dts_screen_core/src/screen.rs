//! End-to-end screen: parse, materialize, summarize, generate, execute

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::backend::{BackendKind, BackendOptions, OutputLine, Resources, WorkflowArtifact};
use crate::combinations::generate_combinations;
use crate::error::{Result, ScreenError};
use crate::materialize::materialize_runs;
use crate::model::{RunId, RunLayout, RunState};
use crate::summary::{SUMMARY_FILE, ScreenSummary};
use crate::template::Template;

/// Everything needed to set up and drive one screen
#[derive(Debug, Clone)]
pub struct ScreenRequest {
    pub template_file: PathBuf,
    pub output_dir: PathBuf,
    pub backend: BackendKind,
    pub options: BackendOptions,
    /// Passed through to the engine, minus any `-in <file>` pair
    pub engine_args: String,
    /// Passed through to the workflow driver
    pub backend_args: String,
    pub resources: Resources,
    /// Write the summary and workflow but run nothing
    pub dry_run: bool,
    /// Remove completion markers left by a previous invocation
    pub invalidate_markers: bool,
}

impl ScreenRequest {
    pub fn new(template_file: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_file: template_file.into(),
            output_dir: output_dir.into(),
            backend: BackendKind::default(),
            options: BackendOptions::default(),
            engine_args: String::new(),
            backend_args: String::new(),
            resources: Resources::new(),
            dry_run: false,
            invalidate_markers: false,
        }
    }
}

/// Run states at the end of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepProgress {
    pub total: usize,
    pub completed: usize,
    /// Dispatched by the driver but left without a completion marker
    pub failed: Vec<RunId>,
    /// Never dispatched in this invocation
    pub pending: Vec<RunId>,
}

impl SweepProgress {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Follows each run through the driver's output.
///
/// Snakemake announces a dispatched job with `rule <name>:` and a failed one
/// with `Error in rule <name>:`; rule names are run ids.
#[derive(Debug, Clone)]
pub struct RunTracker {
    order: Vec<RunId>,
    states: BTreeMap<String, RunState>,
}

impl RunTracker {
    pub fn new(summary: &ScreenSummary) -> Self {
        let order: Vec<RunId> = summary.run_ids().cloned().collect();
        let states = order
            .iter()
            .map(|id| (id.as_str().to_string(), RunState::Pending))
            .collect();
        Self { order, states }
    }

    pub fn state(&self, run_id: &RunId) -> Option<RunState> {
        self.states.get(run_id.as_str()).copied()
    }

    /// Update states from one line of driver output
    pub fn observe_line(&mut self, line: &str) {
        let line = line.trim();
        let (rule, next) = if let Some(rest) = line.strip_prefix("Error in rule ") {
            (rest, RunState::Failed)
        } else if let Some(rest) = line
            .strip_prefix("rule ")
            .or_else(|| line.strip_prefix("localrule "))
        {
            (rest, RunState::Running)
        } else {
            return;
        };

        let rule = rule.trim_end_matches(':').trim();
        if let Some(state) = self.states.get_mut(rule) {
            let advanced = state.advance(next);
            if advanced != *state {
                tracing::debug!(run = rule, from = ?*state, to = ?advanced, "run state changed");
                *state = advanced;
            }
        }
    }

    /// Settle every run against the completion markers on disk.
    ///
    /// A marker always means `Completed`; a dispatched run without one failed.
    pub fn finish(&self, output_dir: &Path) -> SweepProgress {
        let layout = RunLayout::new(output_dir);
        let mut completed = 0;
        let mut failed = Vec::new();
        let mut pending = Vec::new();
        for run_id in &self.order {
            let tracked = self.state(run_id).unwrap_or(RunState::Pending);
            let state = match layout.observe(run_id) {
                RunState::Completed => RunState::Completed,
                _ => tracked.advance(RunState::Failed),
            };
            match state {
                RunState::Completed => completed += 1,
                RunState::Failed => failed.push(run_id.clone()),
                RunState::Pending | RunState::Running => pending.push(run_id.clone()),
            }
        }
        SweepProgress {
            total: self.order.len(),
            completed,
            failed,
            pending,
        }
    }
}

/// Result of [`run_screen`]
#[derive(Debug)]
pub enum ScreenOutcome {
    DryRun {
        summary_path: PathBuf,
        artifact: WorkflowArtifact,
    },
    Executed {
        status: ExitStatus,
        progress: SweepProgress,
    },
}

impl ScreenOutcome {
    /// Process exit code: the driver's own code, zero for a dry run
    pub fn exit_code(&self) -> i32 {
        match self {
            ScreenOutcome::DryRun { .. } => 0,
            ScreenOutcome::Executed { status, .. } => status.code().unwrap_or(1),
        }
    }
}

/// Parse the template and materialize every run, then write the summary.
///
/// Nothing is created on disk if the template fails to parse.
pub fn setup_screen(template_file: &Path, output_dir: &Path) -> Result<ScreenSummary> {
    let template = Template::from_file(template_file)?;
    setup_from_template(&template, template_file, output_dir)
}

fn setup_from_template(
    template: &Template,
    template_file: &Path,
    output_dir: &Path,
) -> Result<ScreenSummary> {
    let combinations = generate_combinations(&template.parameters);
    tracing::info!(
        parameters = ?template.parameter_names(),
        combinations = combinations.len(),
        "parsed template"
    );

    let runs = materialize_runs(template, &combinations, output_dir)?;
    let summary = ScreenSummary::new(template_file, &template.parameters, &runs);
    summary.write(output_dir)?;
    Ok(summary)
}

/// Remove completion markers of every run in the summary.
///
/// Returns how many markers were removed.
pub fn invalidate_markers(summary: &ScreenSummary, output_dir: &Path) -> Result<usize> {
    let layout = RunLayout::new(output_dir);
    let mut removed = 0;
    for run_id in summary.run_ids() {
        let marker = layout.completion_marker(run_id);
        match fs::remove_file(&marker) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ScreenError::io(&marker, e)),
        }
    }
    if removed > 0 {
        tracing::info!(removed, "invalidated completion markers");
    }
    Ok(removed)
}

/// Observe which runs of the summary have a completion marker
pub fn observe_progress(summary: &ScreenSummary, output_dir: &Path) -> SweepProgress {
    RunTracker::new(summary).finish(output_dir)
}

/// Run a whole screen: setup, workflow generation and (unless dry) execution.
///
/// The backend is constructed right after the template parses, so a missing
/// driver aborts before any run directory or workflow file is written. Dry runs
/// never start a process, including the driver availability probe.
pub fn run_screen(
    request: &ScreenRequest,
    sink: &mut dyn FnMut(OutputLine),
) -> Result<ScreenOutcome> {
    let template = Template::from_file(&request.template_file)?;

    let backend = if request.dry_run {
        request.backend.create_unchecked(&request.options)
    } else {
        request.backend.create(&request.options)?
    };

    setup_from_template(&template, &request.template_file, &request.output_dir)?;

    // the backend only ever sees the persisted manifest
    let summary_path = request.output_dir.join(SUMMARY_FILE);
    let summary = ScreenSummary::load(&summary_path)?;

    if request.invalidate_markers {
        invalidate_markers(&summary, &request.output_dir)?;
    }

    let artifact = backend.generate_workflow(
        &summary.runs,
        &request.output_dir,
        &request.engine_args,
        &request.resources,
    )?;

    if request.dry_run {
        tracing::info!(
            backend = backend.name(),
            workflow = %artifact.path.display(),
            "dry run: skipping execution"
        );
        return Ok(ScreenOutcome::DryRun {
            summary_path,
            artifact,
        });
    }

    let mut tracker = RunTracker::new(&summary);
    let status = backend.execute(&artifact, &request.backend_args, &mut |line| {
        tracker.observe_line(line.text());
        sink(line);
    })?;
    let progress = tracker.finish(&request.output_dir);

    tracing::info!(
        completed = progress.completed,
        failed = progress.failed.len(),
        total = progress.total,
        "sweep finished"
    );
    if !progress.failed.is_empty() {
        tracing::warn!(runs = ?progress.failed, "runs finished without completion marker");
    }
    if !progress.pending.is_empty() {
        tracing::debug!(runs = ?progress.pending, "runs never dispatched");
    }

    Ok(ScreenOutcome::Executed { status, progress })
}

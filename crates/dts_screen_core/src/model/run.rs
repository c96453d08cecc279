//! Run identifiers, assignments and the on-disk layout of a run

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::value::ParameterValue;

/// File name of the concrete engine input inside a run directory
pub const INPUT_FILE: &str = "input.dts";
/// File name of the per-run parameter record
pub const PARAMS_FILE: &str = "params.json";
/// Sentinel written by the workflow when the engine produced results
pub const COMPLETION_MARKER: &str = "completed.flag";

/// Parameter name -> value for a single point of the sweep
pub type Assignment = BTreeMap<String, ParameterValue>;

/// Sequential run identifier, e.g. `run_0042`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Build the identifier for the 1-based `index` out of `total` runs.
    ///
    /// Width is the digit count of `total`, capped at 4.
    pub fn new(index: usize, total: usize) -> Self {
        let width = id_width(total);
        RunId(format!("run_{index:0width$}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-pad width used for run identifiers
pub fn id_width(total: usize) -> usize {
    total.to_string().len().min(4)
}

/// A materialized run: identifier, assignment and its directory
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpec {
    pub run_id: RunId,
    pub assignment: Assignment,
    pub directory: PathBuf,
}

impl RunSpec {
    pub fn input_file(&self) -> PathBuf {
        self.directory.join(INPUT_FILE)
    }

    pub fn params_file(&self) -> PathBuf {
        self.directory.join(PARAMS_FILE)
    }

    pub fn completion_marker(&self) -> PathBuf {
        self.directory.join(COMPLETION_MARKER)
    }
}

/// Resolves run directories and their files under an output directory
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.root.join(run_id.as_str())
    }

    pub fn input_file(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join(INPUT_FILE)
    }

    pub fn params_file(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join(PARAMS_FILE)
    }

    pub fn completion_marker(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join(COMPLETION_MARKER)
    }

    /// Observe the state of a run from its directory contents
    pub fn observe(&self, run_id: &RunId) -> RunState {
        if self.completion_marker(run_id).is_file() {
            RunState::Completed
        } else {
            RunState::Pending
        }
    }
}

/// Lifecycle of a single run.
///
/// Valid transitions:
/// - `Pending` -> `Running` (the driver dispatched the job)
/// - `Pending` -> `Completed` (a marker from an earlier invocation)
/// - `Running` -> `Completed`
/// - `Running` -> `Failed`
///
/// Failures are terminal within one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// Move to `next` if the lifecycle allows it, otherwise stay put
    pub fn advance(self, next: RunState) -> RunState {
        match (self, next) {
            (RunState::Pending, RunState::Running | RunState::Completed)
            | (RunState::Running, RunState::Completed | RunState::Failed) => next,
            _ => self,
        }
    }
}

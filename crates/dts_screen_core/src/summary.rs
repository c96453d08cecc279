//! Sweep manifest (`screen_summary.json`)
//!
//! The manifest is the only contract between screen setup and the execution
//! backend: the backend is driven from a loaded summary and the fixed run
//! directory layout, never from the template itself.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreenError};
use crate::model::{Assignment, ParameterDefinition, ParameterValue, RunId, RunSpec};

/// File name of the manifest inside the output directory
pub const SUMMARY_FILE: &str = "screen_summary.json";

/// Statistics for one swept parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStats {
    pub values: Vec<ParameterValue>,
    pub min: ParameterValue,
    pub max: ParameterValue,
    pub count: usize,
}

impl ParameterStats {
    pub fn from_definition(def: &ParameterDefinition) -> Option<Self> {
        Some(Self {
            values: def.values.clone(),
            min: def.min()?.clone(),
            max: def.max()?.clone(),
            count: def.len(),
        })
    }
}

/// One run as recorded in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub parameters: Assignment,
}

/// Sweep-level manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSummary {
    pub template_file: PathBuf,
    pub generated_at: Timestamp,
    pub total_runs: usize,
    pub parameters: Vec<String>,
    pub parameter_ranges: BTreeMap<String, ParameterStats>,
    pub runs: Vec<RunRecord>,
}

impl ScreenSummary {
    pub fn new(
        template_file: &Path,
        parameters: &BTreeMap<String, ParameterDefinition>,
        runs: &[RunSpec],
    ) -> Self {
        Self {
            template_file: template_file.to_path_buf(),
            generated_at: Timestamp::now(),
            total_runs: runs.len(),
            parameters: parameters.keys().cloned().collect(),
            parameter_ranges: parameters
                .iter()
                .filter_map(|(name, def)| {
                    ParameterStats::from_definition(def).map(|stats| (name.clone(), stats))
                })
                .collect(),
            runs: runs
                .iter()
                .map(|run| RunRecord {
                    run_id: run.run_id.clone(),
                    parameters: run.assignment.clone(),
                })
                .collect(),
        }
    }

    /// Write the manifest to `<output_dir>/screen_summary.json`
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| ScreenError::json(&path, e))?;
        fs::write(&path, json).map_err(|e| ScreenError::io(&path, e))?;
        tracing::info!(path = %path.display(), total_runs = self.total_runs, "wrote screen summary");
        Ok(path)
    }

    /// Load a manifest from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ScreenError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| ScreenError::json(path, e))
    }

    pub fn run_ids(&self) -> impl Iterator<Item = &RunId> {
        self.runs.iter().map(|run| &run.run_id)
    }
}

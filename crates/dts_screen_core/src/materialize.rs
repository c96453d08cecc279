//! Run materialization
//!
//! Directory structure:
//! <output_dir>/
//!   run_0001/
//!     input.dts      # template with this run's values substituted
//!     params.json    # flat parameter record
//!     completed.flag # written later by the workflow, never touched here

use std::fs;
use std::path::Path;

use crate::error::{Result, ScreenError};
use crate::model::{Assignment, RunId, RunLayout, RunSpec};
use crate::template::Template;

/// Create one directory per combination and write its input and params files.
///
/// Existing directories are reused and existing input/params files are
/// overwritten, so materializing the same template twice is idempotent.
pub fn materialize_runs(
    template: &Template,
    combinations: &[Assignment],
    output_dir: &Path,
) -> Result<Vec<RunSpec>> {
    fs::create_dir_all(output_dir).map_err(|e| ScreenError::io(output_dir, e))?;

    let layout = RunLayout::new(output_dir);
    let total = combinations.len();
    let mut runs = Vec::with_capacity(total);

    for (i, assignment) in combinations.iter().enumerate() {
        let run_id = RunId::new(i + 1, total);
        let run = RunSpec {
            directory: layout.run_dir(&run_id),
            run_id,
            assignment: assignment.clone(),
        };
        write_run(template, &run)?;
        runs.push(run);
    }

    tracing::info!(
        total_runs = total,
        output_dir = %output_dir.display(),
        "materialized run directories"
    );
    Ok(runs)
}

fn write_run(template: &Template, run: &RunSpec) -> Result<()> {
    match fs::create_dir(&run.directory) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(ScreenError::io(&run.directory, e)),
    }

    let input_file = run.input_file();
    fs::write(&input_file, template.render(&run.assignment))
        .map_err(|e| ScreenError::io(&input_file, e))?;

    let params_file = run.params_file();
    let params = serde_json::to_string_pretty(&run.assignment)
        .map_err(|e| ScreenError::json(&params_file, e))?;
    fs::write(&params_file, params).map_err(|e| ScreenError::io(&params_file, e))?;

    tracing::trace!(run_id = %run.run_id, "wrote run files");
    Ok(())
}

//! Snakefile serialization for a [`Workflow`]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScreenError};

use super::workflow::{Job, Workflow};

/// File name of the generated workflow inside the output directory
pub const SNAKEFILE: &str = "Snakefile";

const INDENT: &str = "    ";

/// Render a workflow as Snakemake rules: an `all` target plus one rule per job
pub fn render(workflow: &Workflow) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Auto-generated Snakefile for DTS parameter screen");
    let _ = writeln!(out, "# Generated on {}", workflow.generated_at);
    out.push('\n');

    let _ = writeln!(out, "rule all:");
    let _ = writeln!(out, "{INDENT}input:");
    for target in workflow.targets() {
        let _ = writeln!(out, "{INDENT}{INDENT}{},", python_str(target));
    }

    for job in &workflow.jobs {
        out.push('\n');
        render_job(&mut out, job);
    }
    out
}

fn render_job(out: &mut String, job: &Job) {
    let _ = writeln!(out, "rule {}:", job.run_id);

    let _ = writeln!(out, "{INDENT}input:");
    for (name, path) in &job.inputs {
        let _ = writeln!(out, "{INDENT}{INDENT}{name}={},", python_str(path));
    }

    let (name, path) = &job.output;
    let _ = writeln!(out, "{INDENT}output:");
    let _ = writeln!(out, "{INDENT}{INDENT}{name}={},", python_str(path));

    let _ = writeln!(out, "{INDENT}threads: {}", job.threads);

    if !job.resources.is_empty() {
        let _ = writeln!(out, "{INDENT}resources:");
        for (key, value) in &job.resources {
            let _ = writeln!(out, "{INDENT}{INDENT}{key}={value},");
        }
    }

    let _ = writeln!(out, "{INDENT}shell:");
    let _ = writeln!(out, "{INDENT}{INDENT}\"\"\"");
    for line in job.shell.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{INDENT}{INDENT}{}", escape_shell_line(&line));
        }
    }
    let _ = writeln!(out, "{INDENT}{INDENT}\"\"\"");
}

/// Write the rendered workflow to `<output_dir>/Snakefile`
pub fn write(workflow: &Workflow, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(SNAKEFILE);
    fs::write(&path, render(workflow)).map_err(|e| ScreenError::io(&path, e))?;
    Ok(path)
}

/// Double-quoted Python string literal
fn python_str(path: &Path) -> String {
    let text = path.to_string_lossy();
    format!("\"{}\"", text.replace('\\', r"\\").replace('"', "\\\""))
}

/// Shell text inside a triple-quoted block: Python escapes first, then the
/// braces Snakemake would otherwise treat as format fields.
fn escape_shell_line(line: &str) -> String {
    line.replace('\\', r"\\")
        .replace('"', "\\\"")
        .replace('{', "{{")
        .replace('}', "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::workflow::{EngineArgs, Resources};
    use crate::model::RunId;

    fn sample(resources: Resources) -> Workflow {
        let ids = vec![RunId::new(1, 2), RunId::new(2, 2)];
        Workflow::build(&ids, "dts", &EngineArgs::parse("-nt 2").unwrap(), "*.res", &resources)
    }

    #[test]
    fn test_render_contains_all_target_and_rules() {
        let text = render(&sample(Resources::new()));

        assert!(text.starts_with("# Auto-generated Snakefile"));
        assert!(text.contains("rule all:\n    input:\n        \"run_1/completed.flag\",\n        \"run_2/completed.flag\",\n"));
        assert!(text.contains("rule run_1:\n"));
        assert!(text.contains("rule run_2:\n"));
        assert!(text.contains("        input_file=\"run_2/input.dts\",\n"));
        assert!(text.contains("        params_file=\"run_2/params.json\",\n"));
        assert!(text.contains("        flag=\"run_2/completed.flag\",\n"));
        assert!(text.contains("    threads: 2\n"));
        assert!(text.contains("        dts -in input.dts -nt 2\n"));
        assert!(!text.contains("resources:"));
    }

    #[test]
    fn test_render_resources_verbatim() {
        let resources: Resources = [
            ("mem_mb".to_string(), "4000".to_string()),
            ("runtime".to_string(), "120".to_string()),
        ]
        .into();
        let text = render(&sample(resources));
        assert!(text.contains("    resources:\n        mem_mb=4000,\n        runtime=120,\n"));
    }

    #[test]
    fn test_escape_shell_line() {
        assert_eq!(escape_shell_line("echo ${HOME}"), "echo ${{HOME}}");
        assert_eq!(escape_shell_line(r"a\b"), r"a\\b");
        assert_eq!(escape_shell_line("say \"hi\""), "say \\\"hi\\\"");
    }

    #[test]
    fn test_python_str() {
        assert_eq!(python_str(Path::new("run_1/input.dts")), "\"run_1/input.dts\"");
        assert_eq!(python_str(Path::new("a\"b")), "\"a\\\"b\"");
    }

    #[test]
    fn test_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&sample(Resources::new()), dir.path()).unwrap();
        assert_eq!(path, dir.path().join(SNAKEFILE));
        assert!(fs::read_to_string(path).unwrap().contains("rule run_2:"));
    }
}

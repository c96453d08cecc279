//! Typed workflow description
//!
//! A workflow is a list of independent jobs, one per run. Each job declares its
//! inputs, the completion marker it produces, its thread and resource requests
//! and the shell procedure that runs the engine. Paths are relative to the
//! output directory, which is the driver's working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jiff::Timestamp;

use crate::error::{Result, ScreenError};
use crate::model::{COMPLETION_MARKER, INPUT_FILE, PARAMS_FILE, RunId};

/// Named resource requests attached verbatim to every job
pub type Resources = BTreeMap<String, String>;

/// Engine flag carrying the input file; always supplied by the job itself
const INPUT_FLAG: &str = "-in";
/// Engine flag carrying the thread count
const THREADS_FLAG: &str = "-nt";

/// Engine arguments after canonicalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineArgs {
    pub args: Vec<String>,
    pub threads: u32,
}

impl EngineArgs {
    /// Split the caller's engine argument string, drop any `-in <file>` pair and
    /// read the thread count from `-nt <n>` (default 1).
    pub fn parse(raw: &str) -> Result<Self> {
        let mut args = split_args(raw)?;

        if let Some(pos) = args.iter().position(|a| a == INPUT_FLAG) {
            let end = (pos + 2).min(args.len());
            args.drain(pos..end);
        }

        let threads = match args.iter().position(|a| a == THREADS_FLAG) {
            Some(pos) => match args.get(pos + 1).map(|v| v.parse::<u32>()) {
                Some(Ok(n)) if n > 0 => n,
                other => {
                    tracing::warn!(value = ?other, "could not read thread count from -nt, using 1");
                    1
                }
            },
            None => 1,
        };

        Ok(Self { args, threads })
    }
}

/// Shell steps a job runs inside its run directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellProcedure {
    pub run_dir: PathBuf,
    pub engine: String,
    pub engine_args: Vec<String>,
    /// Glob matched against the run directory to decide success
    pub result_pattern: String,
}

impl ShellProcedure {
    /// Render the procedure as POSIX shell lines
    pub fn lines(&self) -> Vec<String> {
        let mut invoke = vec![
            shell_quote(&self.engine),
            INPUT_FLAG.to_string(),
            INPUT_FILE.to_string(),
        ];
        invoke.extend(self.engine_args.iter().map(|a| shell_quote(a)));

        vec![
            format!("cd {}", shell_quote(&self.run_dir.to_string_lossy())),
            invoke.join(" "),
            String::new(),
            "# the engine does not signal failure through its exit code,".to_string(),
            "# so success is inferred from its result files".to_string(),
            format!("if ls {} 1> /dev/null 2>&1; then", self.result_pattern),
            format!(
                "    echo 'DTS completed successfully - found {} file(s)'",
                self.result_pattern
            ),
            format!("    touch {COMPLETION_MARKER}"),
            "else".to_string(),
            format!(
                "    echo 'DTS failed - no {} file found' >&2",
                self.result_pattern
            ),
            "    exit 1".to_string(),
            "fi".to_string(),
        ]
    }
}

/// One job of the workflow, keyed by run id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub run_id: RunId,
    pub inputs: Vec<(&'static str, PathBuf)>,
    pub output: (&'static str, PathBuf),
    pub threads: u32,
    pub resources: Resources,
    pub shell: ShellProcedure,
}

/// The full job graph: every job plus a final target requiring all markers
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub generated_at: Timestamp,
    pub jobs: Vec<Job>,
}

impl Workflow {
    pub fn build<'a>(
        run_ids: impl IntoIterator<Item = &'a RunId>,
        engine: &str,
        engine_args: &EngineArgs,
        result_pattern: &str,
        resources: &Resources,
    ) -> Self {
        let jobs = run_ids
            .into_iter()
            .map(|run_id| {
                let run_dir = Path::new(run_id.as_str());
                Job {
                    run_id: run_id.clone(),
                    inputs: vec![
                        ("input_file", run_dir.join(INPUT_FILE)),
                        ("params_file", run_dir.join(PARAMS_FILE)),
                    ],
                    output: ("flag", run_dir.join(COMPLETION_MARKER)),
                    threads: engine_args.threads,
                    resources: resources.clone(),
                    shell: ShellProcedure {
                        run_dir: run_dir.to_path_buf(),
                        engine: engine.to_string(),
                        engine_args: engine_args.args.clone(),
                        result_pattern: result_pattern.to_string(),
                    },
                }
            })
            .collect();

        Self {
            generated_at: Timestamp::now(),
            jobs,
        }
    }

    /// Completion markers the final target depends on
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.jobs.iter().map(|job| job.output.1.as_path())
    }
}

/// Split an argument string the way a POSIX shell would, honoring quotes
pub fn split_args(raw: &str) -> Result<Vec<String>> {
    shell_words::split(raw).map_err(|source| ScreenError::Arguments {
        args: raw.to_string(),
        source,
    })
}

/// Quote a word for POSIX shell unless it is made only of safe characters
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_args_strip_input_pair() {
        let args = EngineArgs::parse("-in other.dts -top topology.top").unwrap();
        assert_eq!(args.args, vec!["-top", "topology.top"]);
        assert_eq!(args.threads, 1);

        let args = EngineArgs::parse("-top t.top -in").unwrap();
        assert_eq!(args.args, vec!["-top", "t.top"]);
    }

    #[test]
    fn test_engine_args_threads() {
        let args = EngineArgs::parse("-nt 8 -seed 42").unwrap();
        assert_eq!(args.threads, 8);
        assert_eq!(args.args, vec!["-nt", "8", "-seed", "42"]);

        assert_eq!(EngineArgs::parse("").unwrap().threads, 1);
        assert_eq!(EngineArgs::parse("-nt").unwrap().threads, 1);
        assert_eq!(EngineArgs::parse("-nt many").unwrap().threads, 1);
    }

    #[test]
    fn test_engine_args_keep_quoted_words() {
        let args = EngineArgs::parse(r#"-top "my top.top" -e 'a b' -nt 2"#).unwrap();
        assert_eq!(args.args, vec!["-top", "my top.top", "-e", "a b", "-nt", "2"]);
        assert_eq!(args.threads, 2);
    }

    #[test]
    fn test_unbalanced_quotes_are_rejected() {
        let err = EngineArgs::parse("-top 'open").unwrap_err();
        assert!(matches!(err, ScreenError::Arguments { .. }));
        assert!(split_args(r#"--cluster "sbatch"#).is_err());
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("dts"), "dts");
        assert_eq!(shell_quote("run_01"), "run_01");
        assert_eq!(shell_quote("my dir"), "'my dir'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_build_one_job_per_run() {
        let ids = vec![RunId::new(1, 2), RunId::new(2, 2)];
        let resources: Resources = [("mem_mb".to_string(), "4000".to_string())].into();
        let workflow = Workflow::build(
            &ids,
            "dts",
            &EngineArgs::parse("-nt 4").unwrap(),
            "*.res",
            &resources,
        );

        assert_eq!(workflow.jobs.len(), 2);
        let job = &workflow.jobs[1];
        assert_eq!(job.run_id.as_str(), "run_2");
        assert_eq!(job.inputs[0].1, PathBuf::from("run_2/input.dts"));
        assert_eq!(job.inputs[1].1, PathBuf::from("run_2/params.json"));
        assert_eq!(job.output.1, PathBuf::from("run_2/completed.flag"));
        assert_eq!(job.threads, 4);
        assert_eq!(job.resources["mem_mb"], "4000");

        let targets: Vec<&Path> = workflow.targets().collect();
        assert_eq!(targets, vec![Path::new("run_1/completed.flag"), Path::new("run_2/completed.flag")]);
    }

    #[test]
    fn test_shell_procedure_checks_result_files() {
        let shell = ShellProcedure {
            run_dir: PathBuf::from("run_3"),
            engine: "dts".to_string(),
            engine_args: vec!["-top".to_string(), "t.top".to_string()],
            result_pattern: "*.res".to_string(),
        };
        let lines = shell.lines();
        assert_eq!(lines[0], "cd run_3");
        assert_eq!(lines[1], "dts -in input.dts -top t.top");
        assert!(lines.contains(&"if ls *.res 1> /dev/null 2>&1; then".to_string()));
        assert!(lines.contains(&"    touch completed.flag".to_string()));
        assert!(lines.contains(&"    exit 1".to_string()));
    }

    #[cfg(unix)]
    mod shell_execution {
        use super::*;
        use std::process::{Command, Output};

        /// Run the procedure with `sh`, defining the engine as a shell function
        fn run_procedure(run_dir: &Path, engine_body: &str) -> Output {
            let shell = ShellProcedure {
                run_dir: run_dir.to_path_buf(),
                engine: "fake_dts".to_string(),
                engine_args: vec!["-nt".to_string(), "1".to_string()],
                result_pattern: "*.res".to_string(),
            };
            let script = format!("fake_dts() {{\n{engine_body}\n}}\n{}\n", shell.lines().join("\n"));
            Command::new("sh").arg("-c").arg(script).output().unwrap()
        }

        #[test]
        fn test_result_file_marks_run_completed() {
            let dir = tempfile::tempdir().unwrap();
            let output = run_procedure(dir.path(), "echo \"$@\" > invocation.txt\ntouch x.res");

            assert_eq!(output.status.code(), Some(0));
            assert!(dir.path().join(COMPLETION_MARKER).is_file());
            let invocation = std::fs::read_to_string(dir.path().join("invocation.txt")).unwrap();
            assert_eq!(invocation.trim(), "-in input.dts -nt 1");
        }

        #[test]
        fn test_missing_result_file_fails_run() {
            let dir = tempfile::tempdir().unwrap();
            // the engine exits zero but writes no result
            let output = run_procedure(dir.path(), "touch x.log");

            assert_eq!(output.status.code(), Some(1));
            assert!(!dir.path().join(COMPLETION_MARKER).exists());
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(stderr.contains("no *.res file found"));
        }
    }
}

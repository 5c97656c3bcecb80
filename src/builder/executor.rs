//! Build executor with progress reporting.
//!
//! Stages run in plan order. A sequential stage stops at its first failing
//! task; the tasks of a parallel stage all run. With fail-fast (the default)
//! the first failed stage ends the build, otherwise only stages of the failed
//! space and of spaces downstream of it are skipped. A failed non-blocking
//! stage skips nothing.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use miette::Diagnostic as MietteDiagnostic;
use rayon::prelude::*;
use thiserror::Error;

use crate::builder::events::{Recorder, TaskRecord};
use crate::builder::plan::{BuildPlan, BuildTask, Stage};
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{ensure_parent, remove_dir_all_if_exists};
use crate::util::process::{find_jdk_tool, ProcessBuilder};

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        ToolOutput {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        ToolOutput {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Runs a named tool with arguments.
pub trait ToolRunner: Send + Sync {
    /// Run `tool` to completion.
    ///
    /// An `Err` means the tool could not be launched at all.
    fn run(&self, tool: &str, args: &[String]) -> Result<ToolOutput>;
}

/// [`ToolRunner`] spawning development kit executables.
#[derive(Debug, Clone, Default)]
pub struct ProcessToolRunner {
    cwd: Option<PathBuf>,
}

impl ProcessToolRunner {
    pub fn new() -> Self {
        ProcessToolRunner::default()
    }

    /// Run tools in `cwd`.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl ToolRunner for ProcessToolRunner {
    fn run(&self, tool: &str, args: &[String]) -> Result<ToolOutput> {
        let program = find_jdk_tool(tool)
            .with_context(|| format!("`{}` not found; set JAVA_HOME or add it to PATH", tool))?;
        let mut process = ProcessBuilder::new(program).args(args);
        if let Some(cwd) = &self.cwd {
            process = process.cwd(cwd);
        }
        let output = process.exec()?;
        Ok(ToolOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// A task that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub label: String,
    /// Full command line of the invocation
    pub command: String,
    /// Exit code; `None` if the tool could not be launched
    pub code: Option<i32>,
    pub message: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "`{}` exited with code {}", self.label, code)?,
            None => write!(f, "`{}` could not be started: {}", self.label, self.message)?,
        }
        write!(f, "\n    {}", self.command)
    }
}

/// One or more build tasks failed.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("{} task(s) failed\n{}", .failures.len(), render(.failures))]
#[diagnostic(
    code(dockyard::build::failed),
    help("run the printed command to reproduce the failure")
)]
pub struct ToolExecutionError {
    pub failures: Vec<TaskFailure>,
    /// Labels of tasks that did not run
    pub skipped: Vec<String>,
}

fn render(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  {}", failure))
        .collect::<Vec<_>>()
        .join("\n")
}

impl ToolExecutionError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(format!("{} task(s) failed", self.failures.len()));
        for failure in &self.failures {
            diag = diag.with_context(failure.to_string());
            let stderr = failure.message.trim();
            if failure.code.is_some() && !stderr.is_empty() {
                diag = diag.with_context(stderr.to_string());
            }
        }
        if !self.skipped.is_empty() {
            diag = diag.with_context(format!("skipped: {}", self.skipped.join(", ")));
        }
        diag.with_suggestion(suggestions::BUILD_FAILED)
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub tasks_run: usize,
    pub duration: Duration,
}

/// Executes build plans through a [`ToolRunner`].
pub struct Executor<'a> {
    runner: &'a dyn ToolRunner,
    recorder: Recorder,
    fail_fast: bool,
    jobs: Option<usize>,
    verbose: bool,
}

impl<'a> Executor<'a> {
    pub fn new(runner: &'a dyn ToolRunner) -> Self {
        Executor {
            runner,
            recorder: Recorder::new(),
            fail_fast: true,
            jobs: None,
            verbose: false,
        }
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Limit the number of parallel package tasks.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Records of every task run so far.
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Execute a build plan with progress reporting.
    pub fn execute(&self, plan: &BuildPlan) -> Result<ExecutionSummary, ToolExecutionError> {
        let start = Instant::now();
        let total = plan.len();

        let pb = if !self.verbose && total > 1 {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .build();
        if let Err(e) = &pool {
            tracing::warn!("failed to create thread pool, using the global pool: {}", e);
        }

        let mut failed_spaces: BTreeSet<&str> = BTreeSet::new();
        let mut failures = Vec::new();
        let mut skipped = Vec::new();

        for (index, stage) in plan.stages.iter().enumerate() {
            let blocked = failed_spaces.contains(stage.space.as_str())
                || stage.upstreams.iter().any(|u| failed_spaces.contains(u.as_str()));
            if blocked {
                failed_spaces.insert(&stage.space);
                skipped.extend(stage.tasks.iter().map(|t| t.label.clone()));
                continue;
            }

            let stage_failures = match (&pool, stage.parallel) {
                (Ok(pool), true) => pool.install(|| self.run_parallel(stage, &pb)),
                (Err(_), true) => self.run_parallel(stage, &pb),
                (_, false) => self.run_sequential(stage, &pb),
            };
            if stage_failures.is_empty() {
                continue;
            }

            if stage.blocking {
                failed_spaces.insert(&stage.space);
            }
            failures.extend(stage_failures);
            if self.fail_fast {
                skipped.extend(
                    plan.stages[index + 1..]
                        .iter()
                        .flat_map(|s| s.tasks.iter().map(|t| t.label.clone())),
                );
                break;
            }
        }
        pb.finish_and_clear();

        let elapsed = start.elapsed();
        let tasks_run = self.recorder.len();
        eprintln!(
            "    Finished {} task(s) in {:.2}s",
            tasks_run,
            elapsed.as_secs_f64()
        );

        if failures.is_empty() {
            Ok(ExecutionSummary {
                tasks_run,
                duration: elapsed,
            })
        } else {
            Err(ToolExecutionError { failures, skipped })
        }
    }

    fn run_parallel(&self, stage: &Stage, pb: &ProgressBar) -> Vec<TaskFailure> {
        stage
            .tasks
            .par_iter()
            .filter_map(|task| self.run_task(task, pb).err())
            .collect()
    }

    fn run_sequential(&self, stage: &Stage, pb: &ProgressBar) -> Vec<TaskFailure> {
        for task in &stage.tasks {
            if let Err(failure) = self.run_task(task, pb) {
                return vec![failure];
            }
        }
        Vec::new()
    }

    fn run_task(&self, task: &BuildTask, pb: &ProgressBar) -> Result<(), TaskFailure> {
        if self.verbose {
            eprintln!("     Running {}", task.command_line());
        }
        pb.set_message(task.label.clone());

        let start = Instant::now();
        let result = self.prepare(task).and_then(|()| self.runner.run(&task.tool, &task.args));
        let duration_ms = start.elapsed().as_millis() as u64;
        pb.inc(1);

        let (code, stdout, stderr) = match result {
            Ok(output) => (Some(output.code), output.stdout, output.stderr),
            Err(e) => (None, String::new(), format!("{:#}", e)),
        };
        self.recorder.record(TaskRecord {
            label: task.label.clone(),
            tool: task.tool.clone(),
            args: task.args.clone(),
            duration_ms,
            code,
            stdout,
            stderr: stderr.clone(),
        });

        if code == Some(0) {
            tracing::debug!("{} finished in {}ms", task.label, duration_ms);
            return Ok(());
        }
        tracing::debug!("{} failed", task.label);
        Err(TaskFailure {
            label: task.label.clone(),
            command: task.command_line(),
            code,
            message: stderr,
        })
    }

    fn prepare(&self, task: &BuildTask) -> Result<()> {
        for dir in &task.clean {
            remove_dir_all_if_exists(dir)?;
        }
        for output in &task.outputs {
            ensure_parent(output)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::arguments::Arguments;
    use crate::builder::plan::TaskKind;
    use crate::test_support::MockToolRunner;
    use tempfile::TempDir;

    fn task(label: &str, tool: &str) -> BuildTask {
        BuildTask::new(label, TaskKind::Compile, tool, Arguments::new().arg(label.replace(' ', "-")))
    }

    fn stage(space: &str, upstreams: &[&str], parallel: bool, tasks: Vec<BuildTask>) -> Stage {
        Stage {
            space: space.to_string(),
            upstreams: upstreams.iter().map(|s| s.to_string()).collect(),
            parallel,
            blocking: true,
            tasks,
        }
    }

    fn two_space_plan() -> BuildPlan {
        BuildPlan {
            project: "p".into(),
            version: "1".into(),
            stages: vec![
                stage("main", &[], false, vec![task("compile main", "javac")]),
                stage(
                    "main",
                    &[],
                    true,
                    vec![task("package a", "jar"), task("package b", "jar")],
                ),
                stage("test", &["main"], false, vec![task("compile test", "javac")]),
                stage("test", &["main"], true, vec![task("package t", "jar")]),
                stage("other", &[], false, vec![task("compile other", "javac")]),
            ],
        }
    }

    #[test]
    fn test_execute_runs_tasks_in_order() {
        let runner = MockToolRunner::new();
        let executor = Executor::new(&runner);
        let summary = executor.execute(&two_space_plan()).unwrap();

        assert_eq!(summary.tasks_run, 6);
        let calls = runner.calls();
        assert_eq!(calls[0].1, vec!["compile-main"]);
        let test = calls.iter().position(|(_, a)| a[0] == "compile-test").unwrap();
        let package = calls.iter().position(|(_, a)| a[0] == "package-b").unwrap();
        assert!(package < test);
    }

    #[test]
    fn test_fail_fast_stops_at_first_failure() {
        let runner =
            MockToolRunner::new().with_output_matching("jar", "package-a", ToolOutput::failure(1, "bad"));
        let executor = Executor::new(&runner);
        let err = executor.execute(&two_space_plan()).unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].code, Some(1));
        assert_eq!(err.failures[0].command, "jar package-a");
        // Both packages of the stage ran; nothing after it.
        assert_eq!(runner.calls().len(), 3);
        assert_eq!(err.skipped, vec!["compile test", "package t", "compile other"]);
    }

    #[test]
    fn test_aggregate_runs_independent_tasks() {
        let runner = MockToolRunner::new()
            .with_output_matching("javac", "compile-main", ToolOutput::failure(2, "nope"))
            .with_output_matching("javac", "compile-other", ToolOutput::failure(3, "nope"));
        let executor = Executor::new(&runner).fail_fast(false);
        let err = executor.execute(&two_space_plan()).unwrap_err();

        let labels: Vec<_> = err.failures.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["compile main", "compile other"]);
        assert_eq!(
            err.skipped,
            vec!["package a", "package b", "compile test", "package t"]
        );
        assert_eq!(executor.recorder().len(), 2);
    }

    #[test]
    fn test_aggregate_keeps_packaging_after_failed_docs() {
        let mut plan = two_space_plan();
        plan.stages.insert(
            1,
            Stage {
                blocking: false,
                ..stage("main", &[], false, vec![task("document main", "javadoc")])
            },
        );
        let runner = MockToolRunner::new()
            .with_output_matching("javadoc", "document-main", ToolOutput::failure(1, "bad doc"));
        let executor = Executor::new(&runner).fail_fast(false);
        let err = executor.execute(&plan).unwrap_err();

        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].label, "document main");
        assert!(err.skipped.is_empty());
        assert_eq!(executor.recorder().len(), 7);
    }

    #[test]
    fn test_fail_fast_stops_at_failed_docs() {
        let mut plan = two_space_plan();
        plan.stages.insert(
            1,
            Stage {
                blocking: false,
                ..stage("main", &[], false, vec![task("document main", "javadoc")])
            },
        );
        let runner = MockToolRunner::new().with_output("javadoc", ToolOutput::failure(1, "bad doc"));
        let err = Executor::new(&runner).execute(&plan).unwrap_err();

        assert_eq!(err.failures[0].label, "document main");
        assert_eq!(err.skipped.len(), 5);
    }

    #[test]
    fn test_error_includes_command_line() {
        let runner = MockToolRunner::new().with_output("javac", ToolOutput::failure(1, "error: x"));
        let plan = BuildPlan {
            stages: vec![stage(
                "main",
                &[],
                false,
                vec![BuildTask::new(
                    "compile main",
                    TaskKind::Compile,
                    "javac",
                    Arguments::new().with("--module", "a,b").with("-d", "out dir"),
                )],
            )],
            ..BuildPlan::default()
        };
        let err = Executor::new(&runner).execute(&plan).unwrap_err();

        assert!(err.to_string().contains("javac --module a,b -d \"out dir\""));
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("error: x"));
    }

    #[test]
    fn test_launch_failure_is_reported() {
        let runner = MockToolRunner::new().with_launch_error("javac");
        let plan = BuildPlan {
            stages: vec![stage("main", &[], false, vec![task("compile main", "javac")])],
            ..BuildPlan::default()
        };
        let err = Executor::new(&runner).execute(&plan).unwrap_err();
        assert_eq!(err.failures[0].code, None);
        assert!(err.to_string().contains("could not be started"));
    }

    #[test]
    fn test_prepare_creates_and_cleans_directories() {
        let tmp = TempDir::new().unwrap();
        let stale = tmp.path().join("image");
        std::fs::create_dir_all(stale.join("bin")).unwrap();
        let jar = tmp.path().join("out/modules/a@1.jar");

        let runner = MockToolRunner::new();
        let plan = BuildPlan {
            stages: vec![stage(
                "main",
                &[],
                false,
                vec![
                    task("package a", "jar").with_output(&jar),
                    task("link main", "jlink").with_clean(&stale),
                ],
            )],
            ..BuildPlan::default()
        };
        Executor::new(&runner).execute(&plan).unwrap();

        assert!(jar.parent().unwrap().is_dir());
        assert!(!stale.exists());
    }
}

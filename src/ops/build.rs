//! Implementation of `dockyard plan` and `dockyard build`.

use anyhow::Result;

use crate::builder::events::BuildEvent;
use crate::builder::executor::{ExecutionSummary, Executor, ToolRunner};
use crate::builder::plan::{BuildPlan, BuildSequencer, PlanOptions};
use crate::ops::resolve::{resolve, ResolveOptions};
use crate::core::project::Project;
use crate::ops::scan::Session;
use crate::util::diagnostic::Diagnostic;
use crate::util::GlobalContext;

/// Output format of build events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageFormat {
    /// Progress bar and status lines
    #[default]
    Human,
    /// One JSON event per line on stdout
    Json,
}

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Number of parallel package tasks
    pub jobs: Option<usize>,

    /// Stop at the first failed task; `None` uses the configuration
    pub fail_fast: Option<bool>,

    /// Never touch the network
    pub offline: bool,

    /// Verbose output
    pub verbose: bool,

    pub message_format: MessageFormat,
}

/// Plan the build of a session.
///
/// Fails with the complete list of missing modules if any are missing.
pub fn plan(session: &Session) -> Result<BuildPlan> {
    let plan = BuildSequencer::new(&session.project, &session.context)
        .with_options(PlanOptions::from_config(&session.config))
        .plan(&session.survey)?;
    Ok(plan)
}

/// Warnings about a project that still plans.
///
/// A space generating a runtime image needs exactly one unit with a main
/// class to get a launcher.
pub fn warnings(project: &Project) -> Vec<Diagnostic> {
    project
        .spaces()
        .iter()
        .filter(|space| space.flags().image && space.main_module().is_none())
        .map(|space| {
            let mains: Vec<&str> = space
                .units()
                .values()
                .filter(|unit| unit.descriptor.main_class().is_some())
                .map(|unit| unit.name())
                .collect();
            let diag = Diagnostic::warning(format!(
                "runtime image of space `{}` gets no launcher",
                space.name()
            ));
            if mains.is_empty() {
                diag.with_context("no module of the space has a main class")
            } else {
                diag.with_context(format!("several modules have a main class: {}", mains.join(", ")))
            }
        })
        .collect()
}

/// Resolve missing modules, then plan and execute the build.
pub fn build(
    ctx: &GlobalContext,
    session: &Session,
    opts: &BuildOptions,
    runner: &dyn ToolRunner,
) -> Result<ExecutionSummary> {
    resolve(
        ctx,
        session,
        &ResolveOptions {
            offline: opts.offline,
        },
    )?;
    let plan = plan(session)?;
    tracing::info!("Building {} {} ({} task(s))", plan.project, plan.version, plan.len());

    let json = opts.message_format == MessageFormat::Json;
    if json {
        let labels = plan.labels().into_iter().map(str::to_string).collect();
        println!("{}", BuildEvent::started(&plan.project, &plan.version, labels).to_json());
    }

    let executor = Executor::new(runner)
        .fail_fast(opts.fail_fast.unwrap_or(session.config.fail_fast()))
        .jobs(opts.jobs.or(session.config.build.jobs))
        .verbose(opts.verbose || json);
    let result = executor.execute(&plan);

    if json {
        for record in executor.recorder().records() {
            println!("{}", BuildEvent::task(&record).to_json());
        }
        let (success, duration_ms) = match &result {
            Ok(summary) => (true, summary.duration.as_millis() as u64),
            Err(e) => {
                for label in &e.skipped {
                    println!("{}", BuildEvent::skipped(label).to_json());
                }
                (false, 0)
            }
        };
        let tasks_run = executor.recorder().len() as u64;
        println!("{}", BuildEvent::finished(success, duration_ms, tasks_run).to_json());
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::executor::{ToolExecutionError, ToolOutput};
    use crate::builder::plan::PlanError;
    use crate::resolver::ResolutionError;
    use crate::test_support::fixtures::ProjectFixture;
    use crate::test_support::MockToolRunner;

    fn open(fixture: &ProjectFixture) -> (GlobalContext, Session) {
        let ctx = GlobalContext::with_cwd(fixture.path().to_path_buf())
            .unwrap()
            .with_home(fixture.path().join(".home"));
        let runner = MockToolRunner::new().with_launch_error("java");
        let session = Session::open(&ctx, fixture.path(), &runner).unwrap();
        (ctx, session)
    }

    #[test]
    fn test_build_quick_start() {
        let fixture = ProjectFixture::jigsaw_quick_start();
        let (ctx, session) = open(&fixture);
        let runner = MockToolRunner::new();

        let summary = build(&ctx, &session, &BuildOptions::default(), &runner).unwrap();
        assert_eq!(summary.tasks_run, 5);
        assert_eq!(runner.tools(), vec!["javac", "jar", "jar", "javac", "jar"]);
    }

    #[test]
    fn test_build_uses_configured_fail_fast() {
        let fixture = ProjectFixture::jigsaw_quick_start()
            .with_file(".dockyard/config.toml", "[build]\nfail_fast = false\n");
        let (ctx, session) = open(&fixture);
        let runner = MockToolRunner::new()
            .with_output_matching("jar", "org.astro", ToolOutput::failure(1, "broken"));

        let err = build(&ctx, &session, &BuildOptions::default(), &runner).unwrap_err();
        let err = err.downcast_ref::<ToolExecutionError>().unwrap();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.skipped, vec!["compile test", "package test.modules"]);
        // com.greetings was still packaged
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn test_warns_about_image_without_launcher() {
        let fixture = ProjectFixture::new("image")
            .with_module("src/a/main/java", "module a {}")
            .with_file("dockyard.toml", "[[space]]\nname = \"main\"\nimage = true\n");
        let (_, session) = open(&fixture);

        let warnings = warnings(&session.project);
        assert_eq!(warnings.len(), 1);
        let text = warnings[0].format(false);
        assert!(text.starts_with("warning: runtime image of space `main` gets no launcher"));
        assert!(text.contains("no module of the space has a main class"));
    }

    #[test]
    fn test_no_warnings_for_quick_start() {
        let fixture = ProjectFixture::jigsaw_quick_start();
        let (_, session) = open(&fixture);
        assert!(warnings(&session.project).is_empty());
    }

    #[test]
    fn test_plan_blocked_by_missing_modules() {
        let fixture =
            ProjectFixture::new("missing").with_module("a", "module a { requires b; requires c; }");
        let (_, session) = open(&fixture);

        let err = plan(&session).unwrap_err();
        match err.downcast_ref::<PlanError>() {
            Some(PlanError::Resolution(ResolutionError::Unresolved { modules })) => {
                assert_eq!(modules.len(), 2)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

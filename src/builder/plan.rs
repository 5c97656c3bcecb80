//! Build plan generation.
//!
//! A [`BuildPlan`] is a list of stages in space order. The stages of a space
//! are: compile, the optional documentation, package (one task per module, run
//! in parallel), the optional runtime image and, for a space with upstreams,
//! one test run per module when the JUnit console launcher is available. A
//! space's stages always follow the stages of its upstream spaces.

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::builder::arguments::Arguments;
use crate::builder::source_path::{join_paths, SourcePathResolver};
use crate::core::project::Project;
use crate::core::space::Space;
use crate::core::unit::ModuleUnit;
use crate::resolver::{ResolutionContext, ResolutionError, Survey};
use crate::scanner::layout::LayoutError;
use crate::util::config::{Config, DEFAULT_RELEASE};

/// Module launching the JUnit Platform.
pub const TEST_LAUNCHER: &str = "org.junit.platform.console";

/// Error that prevents a plan from being created.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PlanError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Layout(#[from] LayoutError),
}

/// What a task produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Compile,
    Document,
    Package,
    Link,
    Test,
}

/// A single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTask {
    pub label: String,
    pub kind: TaskKind,
    pub tool: String,
    pub args: Vec<String>,

    /// Files whose parent directories must exist before running
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PathBuf>,

    /// Directories removed before running
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clean: Vec<PathBuf>,
}

impl BuildTask {
    pub fn new(label: impl Into<String>, kind: TaskKind, tool: &str, args: Arguments) -> Self {
        BuildTask {
            label: label.into(),
            kind,
            tool: tool.to_string(),
            args: args.into_vec(),
            outputs: Vec::new(),
            clean: Vec::new(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.outputs.push(output.into());
        self
    }

    pub fn with_clean(mut self, dir: impl Into<PathBuf>) -> Self {
        self.clean.push(dir.into());
        self
    }

    /// The full command line, for reproducing the task by hand.
    pub fn command_line(&self) -> String {
        crate::util::process::command_line(&self.tool, &self.args)
    }
}

/// Tasks of one space that run together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub space: String,
    pub upstreams: Vec<String>,

    /// Whether the tasks are independent of each other
    pub parallel: bool,

    /// Whether a failure skips the later stages of the space
    pub blocking: bool,

    pub tasks: Vec<BuildTask>,
}

/// An ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub project: String,
    pub version: String,
    pub stages: Vec<Stage>,
}

impl BuildPlan {
    /// All tasks in execution order.
    pub fn tasks(&self) -> impl Iterator<Item = &BuildTask> {
        self.stages.iter().flat_map(|stage| stage.tasks.iter())
    }

    pub fn labels(&self) -> Vec<&str> {
        self.tasks().map(|task| task.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the plan as one command line per task.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, task) in self.tasks().enumerate() {
            out.push_str(&format!("{:>3}. {}\n     {}\n", index + 1, task.label, task.command_line()));
        }
        out
    }
}

/// Options affecting generated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Release used with `--enable-preview` when a space sets none
    pub release: u32,
    pub javac_args: Vec<String>,
    pub jar_args: Vec<String>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            release: DEFAULT_RELEASE,
            javac_args: Vec::new(),
            jar_args: Vec::new(),
        }
    }
}

impl PlanOptions {
    pub fn from_config(config: &Config) -> Self {
        PlanOptions {
            release: config.release(),
            javac_args: config.build.javac_args.clone(),
            jar_args: config.build.jar_args.clone(),
        }
    }
}

/// Turns a project into an ordered build plan.
pub struct BuildSequencer<'a> {
    project: &'a Project,
    context: &'a ResolutionContext,
    options: PlanOptions,
}

impl<'a> BuildSequencer<'a> {
    pub fn new(project: &'a Project, context: &'a ResolutionContext) -> Self {
        BuildSequencer {
            project,
            context,
            options: PlanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PlanOptions) -> Self {
        self.options = options;
        self
    }

    /// Create the plan.
    ///
    /// Nothing is planned while any required module is missing; all of them
    /// are reported together.
    pub fn plan(&self, survey: &Survey) -> Result<BuildPlan, PlanError> {
        let missing = self.context.missing(survey)?;
        if !missing.is_empty() {
            return Err(survey.unresolved(missing).into());
        }

        let use_library = self.uses_library(survey);
        let run_tests = self.has_test_launcher();
        let resolver = SourcePathResolver::new(self.project);
        let mut stages = Vec::new();
        for space in self.project.spaces() {
            stages.extend(self.space_stages(space, &resolver, use_library)?);
            if run_tests && !space.upstreams().is_empty() && !space.is_empty() {
                stages.push(self.junit_stage(space, use_library));
            }
        }
        tracing::debug!("planned {} stage(s)", stages.len());

        Ok(BuildPlan {
            project: self.project.name().to_string(),
            version: self.project.version().to_string(),
            stages,
        })
    }

    /// The library belongs on the module path if external modules are
    /// required or already present.
    fn uses_library(&self, survey: &Survey) -> bool {
        let external = survey
            .names()
            .into_iter()
            .any(|name| !self.context.system().contains(&name) && !self.context.declared().contains(&name));
        external
            || self
                .context
                .library()
                .module_names()
                .is_ok_and(|names| !names.is_empty())
    }

    fn has_test_launcher(&self) -> bool {
        self.context.declared().contains(TEST_LAUNCHER)
            || self
                .context
                .library()
                .module_names()
                .is_ok_and(|names| names.contains(TEST_LAUNCHER))
    }

    fn space_stages(
        &self,
        space: &Space,
        resolver: &SourcePathResolver<'_>,
        use_library: bool,
    ) -> Result<Vec<Stage>, PlanError> {
        let paths = self.project.paths();
        let stage = |parallel: bool, tasks: Vec<BuildTask>| Stage {
            space: space.name().to_string(),
            upstreams: space.upstreams().to_vec(),
            parallel,
            blocking: true,
            tasks,
        };

        let mut module_path: Vec<PathBuf> = self
            .project
            .upstreams_of(space)
            .map(|upstream| paths.modules(upstream.name()))
            .collect();
        if use_library {
            module_path.push(paths.lib().to_path_buf());
        }

        let modules = space.module_names().collect::<Vec<_>>().join(",");
        let source_path = resolver.module_source_path(space)?.to_values();
        let patches: Vec<String> = resolver
            .patch_map(space)
            .into_iter()
            .map(|(module, sources)| format!("{}={}", module, join_paths(sources)))
            .collect();

        let common = Arguments::new()
            .with("--module", modules.as_str())
            .with_each("--module-source-path", source_path)
            .with_opt(
                "--module-path",
                (!module_path.is_empty()).then(|| join_paths(&module_path)),
            )
            .with_each("--patch-module", patches);
        let common = self.release_arguments(space, common);

        let compile = BuildTask::new(
            format!("compile {}", space.name()),
            TaskKind::Compile,
            "javac",
            common
                .clone()
                .with_path("-d", &paths.classes(space.name()))
                .args(self.options.javac_args.iter().cloned()),
        );
        let mut stages = vec![stage(false, vec![compile])];
        if space.flags().docs {
            let document = BuildTask::new(
                format!("document {}", space.name()),
                TaskKind::Document,
                "javadoc",
                common.with_path("-d", &paths.api(space.name())),
            )
            .with_clean(paths.api(space.name()));
            stages.push(Stage {
                blocking: false,
                ..stage(false, vec![document])
            });
        }

        let packages: Vec<BuildTask> = space
            .units()
            .values()
            .map(|unit| self.package_task(space, unit))
            .collect();
        stages.push(stage(true, packages));
        if space.flags().image {
            let mut image_path = vec![paths.modules(space.name())];
            image_path.extend(module_path);
            stages.push(stage(false, vec![self.image_task(space, &image_path)]));
        }
        Ok(stages)
    }

    /// One console launcher run per module, selecting the module's tests.
    ///
    /// The module's own archive leads the module path and shadows any upstream
    /// archive of the same name.
    fn junit_stage(&self, space: &Space, use_library: bool) -> Stage {
        let paths = self.project.paths();
        let version = self.project.version();
        let mut shared = vec![paths.modules(space.name())];
        shared.extend(
            self.project
                .upstreams_of(space)
                .map(|upstream| paths.modules(upstream.name())),
        );
        if use_library {
            shared.push(paths.lib().to_path_buf());
        }

        let tasks = space
            .module_names()
            .map(|module| {
                let mut module_path = vec![paths.module_jar(space.name(), module, version)];
                module_path.extend(shared.iter().cloned());
                let reports = paths.reports(space.name()).join(module);
                let args = Arguments::new()
                    .with("--module-path", join_paths(&module_path))
                    .with("--add-modules", module)
                    .with("--module", TEST_LAUNCHER)
                    .with("--select-module", module)
                    .with_path("--reports-dir", &reports)
                    .arg("--disable-banner");
                BuildTask::new(format!("test {}", module), TaskKind::Test, "java", args)
                    .with_clean(reports)
            })
            .collect();

        Stage {
            space: space.name().to_string(),
            upstreams: space.upstreams().to_vec(),
            parallel: true,
            blocking: true,
            tasks,
        }
    }

    fn release_arguments(&self, space: &Space, args: Arguments) -> Arguments {
        if space.flags().preview {
            let release = space.release().unwrap_or(self.options.release);
            return args
                .arg("--enable-preview")
                .with("--release", release.to_string());
        }
        args.with_opt("--release", space.release().map(|r| r.to_string()))
    }

    fn package_task(&self, space: &Space, unit: &ModuleUnit) -> BuildTask {
        let paths = self.project.paths();
        let version = self.project.version();
        let file = paths.module_jar(space.name(), unit.name(), version);

        let mut args = Arguments::new()
            .arg("--create")
            .with_path("--file", &file)
            .with("--module-version", version)
            .with_opt("--main-class", unit.descriptor.main_class())
            .with_path("-C", &paths.module_classes(space.name(), unit.name()))
            .arg(".");
        for resources in &unit.resources {
            args = change_dir(args, resources);
        }
        if space.flags().include_sources {
            for source in &unit.sources {
                args = change_dir(args, &source.path);
            }
        }
        let args = args.args(self.options.jar_args.iter().cloned());

        BuildTask::new(format!("package {}", unit.name()), TaskKind::Package, "jar", args)
            .with_output(file)
    }

    fn image_task(&self, space: &Space, module_path: &[PathBuf]) -> BuildTask {
        let output = self.project.paths().image(space.name());
        let modules = space.module_names().collect::<Vec<_>>().join(",");
        let launcher = space.main_module().map(|unit| {
            let name = unit.name();
            let command = name.rsplit('.').next().unwrap_or(name);
            format!("{}={}", command, name)
        });
        let args = Arguments::new()
            .with_path("--output", &output)
            .with("--module-path", join_paths(module_path))
            .with("--add-modules", modules)
            .with_opt("--launcher", launcher);

        BuildTask::new(format!("link {}", space.name()), TaskKind::Link, "jlink", args)
            .with_output(output.clone())
            .with_clean(output)
    }
}

fn change_dir(args: Arguments, dir: &Path) -> Arguments {
    args.with_path("-C", dir).arg(".")
}

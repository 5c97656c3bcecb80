//! Implementation of `dockyard scan`.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::builder::executor::ToolRunner;
use crate::core::project::Project;
use crate::core::space::Space;
use crate::resolver::{ResolutionContext, Survey, SystemModules};
use crate::scanner::Scanner;
use crate::util::config::Config;
use crate::util::fs::relative_path;
use crate::util::GlobalContext;

/// A scanned project together with everything needed to resolve and build it.
#[derive(Debug)]
pub struct Session {
    pub project: Project,
    pub config: Config,
    pub context: ResolutionContext,
    pub survey: Survey,
}

impl Session {
    /// Scan the project at `root` and load its configuration.
    ///
    /// System modules come from the manifest, or else from the runtime
    /// reached through `runner`.
    pub fn open(ctx: &GlobalContext, root: &Path, runner: &dyn ToolRunner) -> Result<Self> {
        let project = scan_project(root)?;
        let config = ctx.config(root);
        let system = match &project.library().system {
            Some(names) => SystemModules::configured(Some(names)),
            None => SystemModules::detect(runner),
        };
        tracing::debug!("{} system module(s)", system.len());

        let context = ResolutionContext::of(&project, system);
        let survey = Survey::of(&project);
        Ok(Session {
            project,
            config,
            context,
            survey,
        })
    }

    /// Required modules not yet available.
    pub fn missing(&self) -> Result<BTreeSet<String>> {
        Ok(self.context.missing(&self.survey)?)
    }
}

/// Scan a project directory.
pub fn scan_project(root: &Path) -> Result<Project> {
    Scanner::new(root)?
        .scan()
        .with_context(|| format!("failed to scan {}", root.display()))
}

/// Render spaces, units and missing modules of a session.
pub fn report(session: &Session) -> Result<String> {
    let project = &session.project;
    let mut out = String::new();
    writeln!(out, "project {} {}", project.name(), project.version())?;
    for space in project.spaces() {
        write_space(&mut out, project, space)?;
    }

    let missing = session.missing()?;
    if missing.is_empty() {
        writeln!(out, "missing: none")?;
    } else {
        writeln!(out, "missing ({}):", missing.len())?;
        for module in &missing {
            let required_by = session.survey.required_by(module);
            if required_by.is_empty() {
                writeln!(out, "  {}", module)?;
            } else {
                writeln!(out, "  {} (required by {})", module, required_by.join(", "))?;
            }
        }
    }
    Ok(out)
}

fn write_space(out: &mut String, project: &Project, space: &Space) -> Result<()> {
    let upstreams = if space.upstreams().is_empty() {
        "-".to_string()
    } else {
        space.upstreams().join(", ")
    };
    write!(out, "space {} (upstreams: {})", space.name(), upstreams)?;
    let flags = space.flags();
    let enabled: Vec<&str> = [
        (flags.docs, "docs"),
        (flags.image, "image"),
        (flags.preview, "preview"),
        (flags.include_sources, "sources"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();
    if !enabled.is_empty() {
        write!(out, " [{}]", enabled.join(", "))?;
    }
    writeln!(out)?;

    for unit in space.units().values() {
        let source = unit
            .primary_source()
            .map(|p| relative_path(project.paths().root(), p).display().to_string())
            .unwrap_or_default();
        write!(out, "  {:<24} {}", unit.name(), source)?;
        if let Some(main) = unit.descriptor.main_class() {
            write!(out, " (main: {})", main)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

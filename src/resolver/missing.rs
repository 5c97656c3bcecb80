//! Missing-module computation.
//!
//! `missing = required - system - declared - library`, evaluated against an
//! explicitly constructed [`ResolutionContext`] so that no state is shared
//! between builds.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::builder::executor::ToolRunner;
use crate::core::manifest::MANIFEST_NAME;
use crate::core::project::{amend_conventions, Project};
use crate::resolver::errors::{ResolutionError, Unresolved};
use crate::sources::library::Library;

/// Platform modules shipped with a current runtime.
const BUILTIN_SYSTEM_MODULES: &[&str] = &[
    "java.base",
    "java.compiler",
    "java.datatransfer",
    "java.desktop",
    "java.instrument",
    "java.logging",
    "java.management",
    "java.management.rmi",
    "java.naming",
    "java.net.http",
    "java.prefs",
    "java.rmi",
    "java.scripting",
    "java.se",
    "java.security.jgss",
    "java.security.sasl",
    "java.smartcardio",
    "java.sql",
    "java.sql.rowset",
    "java.transaction.xa",
    "java.xml",
    "java.xml.crypto",
    "jdk.accessibility",
    "jdk.attach",
    "jdk.charsets",
    "jdk.compiler",
    "jdk.crypto.cryptoki",
    "jdk.crypto.ec",
    "jdk.dynalink",
    "jdk.editpad",
    "jdk.hotspot.agent",
    "jdk.httpserver",
    "jdk.incubator.vector",
    "jdk.jartool",
    "jdk.javadoc",
    "jdk.jcmd",
    "jdk.jconsole",
    "jdk.jdeps",
    "jdk.jdi",
    "jdk.jdwp.agent",
    "jdk.jfr",
    "jdk.jlink",
    "jdk.jpackage",
    "jdk.jshell",
    "jdk.jsobject",
    "jdk.jstatd",
    "jdk.localedata",
    "jdk.management",
    "jdk.management.agent",
    "jdk.management.jfr",
    "jdk.naming.dns",
    "jdk.naming.rmi",
    "jdk.net",
    "jdk.nio.mapmode",
    "jdk.random",
    "jdk.sctp",
    "jdk.security.auth",
    "jdk.security.jgss",
    "jdk.unsupported",
    "jdk.unsupported.desktop",
    "jdk.xml.dom",
    "jdk.zipfs",
];

/// Names of modules provided by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemModules(BTreeSet<String>);

impl SystemModules {
    /// The built-in list.
    pub fn builtin() -> Self {
        Self::of(BUILTIN_SYSTEM_MODULES.iter().copied())
    }

    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SystemModules(names.into_iter().map(Into::into).collect())
    }

    /// Use the configured names, or the built-in list.
    pub fn configured(names: Option<&BTreeSet<String>>) -> Self {
        match names {
            Some(names) => SystemModules(names.clone()),
            None => Self::builtin(),
        }
    }

    /// Ask the runtime for its modules, falling back to the built-in list.
    pub fn detect(runner: &dyn ToolRunner) -> Self {
        let args = vec!["--list-modules".to_string()];
        match runner.run("java", &args) {
            Ok(output) if output.code == 0 => {
                let names: BTreeSet<String> = output
                    .stdout
                    .lines()
                    .filter_map(|line| line.split('@').next())
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    Self::builtin()
                } else {
                    SystemModules(names)
                }
            }
            Ok(output) => {
                tracing::warn!("`java --list-modules` exited with {}; using built-in list", output.code);
                Self::builtin()
            }
            Err(e) => {
                tracing::debug!("listing system modules failed: {:#}", e);
                Self::builtin()
            }
        }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.0.contains(module)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A declaration requiring a module: the unit of a space or the manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Requirer {
    space: Option<String>,
    module: String,
}

impl fmt::Display for Requirer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.space {
            Some(space) => write!(f, "{}/{}", space, self.module),
            None => write!(f, "{}", self.module),
        }
    }
}

/// Every required module name with the modules requiring it.
///
/// A module declared in several spaces requires on behalf of each of its
/// units, so their pins are kept apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Survey {
    /// module -> (requirer -> pinned version)
    requirements: BTreeMap<String, BTreeMap<Requirer, Option<String>>>,
}

impl Survey {
    /// Survey all declarations and the configured extra requires of a project.
    ///
    /// Well-known test-engine modules implied by the survey are amended.
    pub fn of(project: &Project) -> Self {
        let mut survey = Survey::default();
        for (space, unit) in project.units() {
            for requires in unit.descriptor.requires() {
                survey.insert(
                    &requires.name,
                    Requirer {
                        space: Some(space.name().to_string()),
                        module: unit.name().to_string(),
                    },
                    requires.version.clone(),
                );
            }
        }
        for module in &project.library().requires {
            survey.add(module, MANIFEST_NAME, None);
        }

        let mut names = survey.names();
        amend_conventions(&mut names);
        for name in names {
            survey.requirements.entry(name).or_default();
        }
        survey
    }

    /// Record that `requirer` requires `module`.
    pub fn add(&mut self, module: &str, requirer: &str, version: Option<String>) {
        let requirer = Requirer {
            space: None,
            module: requirer.to_string(),
        };
        self.insert(module, requirer, version);
    }

    fn insert(&mut self, module: &str, requirer: Requirer, version: Option<String>) {
        self.requirements
            .entry(module.to_string())
            .or_default()
            .insert(requirer, version);
    }

    /// All required module names.
    pub fn names(&self) -> BTreeSet<String> {
        self.requirements.keys().cloned().collect()
    }

    /// Modules requiring `module`, sorted.
    pub fn required_by(&self, module: &str) -> Vec<String> {
        self.requirements
            .get(module)
            .map(|requirers| {
                requirers
                    .keys()
                    .map(|r| r.module.clone())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Report `modules` as unresolved, naming their requirers.
    pub fn unresolved(&self, modules: impl IntoIterator<Item = String>) -> ResolutionError {
        ResolutionError::Unresolved {
            modules: modules
                .into_iter()
                .map(|module| Unresolved {
                    required_by: self.required_by(&module),
                    module,
                })
                .collect(),
        }
    }

    /// The pinned version of a module, failing if requirers disagree.
    pub fn version(&self, module: &str) -> Result<Option<String>, ResolutionError> {
        let Some(requirers) = self.requirements.get(module) else {
            return Ok(None);
        };
        let pinned: Vec<(String, String)> = requirers
            .iter()
            .filter_map(|(requirer, version)| Some((requirer.to_string(), version.clone()?)))
            .collect();
        let distinct: BTreeSet<&str> = pinned.iter().map(|(_, v)| v.as_str()).collect();
        match distinct.len() {
            0 => Ok(None),
            1 => Ok(pinned.first().map(|(_, v)| v.clone())),
            _ => Err(ResolutionError::VersionConflict {
                module: module.to_string(),
                requirements: pinned,
            }),
        }
    }
}

/// Everything needed to decide whether a module is missing.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    system: SystemModules,
    declared: BTreeSet<String>,
    library: Library,
}

impl ResolutionContext {
    pub fn new(system: SystemModules, declared: BTreeSet<String>, library: Library) -> Self {
        ResolutionContext {
            system,
            declared,
            library,
        }
    }

    /// Build the context of a project with the given system modules.
    pub fn of(project: &Project, system: SystemModules) -> Self {
        Self::new(
            system,
            project.declared_module_names(),
            Library::new(project.paths().lib()),
        )
    }

    pub fn system(&self) -> &SystemModules {
        &self.system
    }

    pub fn declared(&self) -> &BTreeSet<String> {
        &self.declared
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Required modules that are neither system, declared nor in the library.
    ///
    /// The library directory is listed on every call.
    pub fn missing(&self, survey: &Survey) -> Result<BTreeSet<String>, ResolutionError> {
        let present = self
            .library
            .module_names()
            .map_err(|e| ResolutionError::Library {
                message: format!("{:#}", e),
            })?;
        Ok(survey
            .names()
            .into_iter()
            .filter(|name| !self.system.contains(name))
            .filter(|name| !self.declared.contains(name))
            .filter(|name| !present.contains(name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::executor::ToolOutput;
    use crate::scanner::Scanner;
    use crate::test_support::fixtures::ProjectFixture;
    use crate::test_support::MockToolRunner;
    use std::fs;
    use tempfile::TempDir;

    fn survey(entries: &[(&str, &str, Option<&str>)]) -> Survey {
        let mut survey = Survey::default();
        for (module, requirer, version) in entries {
            survey.add(module, requirer, version.map(str::to_string));
        }
        survey
    }

    #[test]
    fn test_missing_set_difference() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("org.present@1.jar"), "").unwrap();
        let context = ResolutionContext::new(
            SystemModules::builtin(),
            ["org.astro".to_string()].into(),
            Library::new(tmp.path()),
        );
        let survey = survey(&[
            ("java.logging", "a", None),
            ("org.astro", "a", None),
            ("org.present", "a", None),
            ("org.absent", "a", None),
        ]);

        let missing: Vec<_> = context.missing(&survey).unwrap().into_iter().collect();
        assert_eq!(missing, vec!["org.absent"]);
    }

    #[test]
    fn test_missing_never_grows() {
        let tmp = TempDir::new().unwrap();
        let context = ResolutionContext::new(
            SystemModules::builtin(),
            BTreeSet::new(),
            Library::new(tmp.path()),
        );
        let survey = survey(&[("a", "x", None), ("b", "x", None), ("c", "x", None)]);

        let before = context.missing(&survey).unwrap();
        fs::write(tmp.path().join("b.jar"), "").unwrap();
        let after = context.missing(&survey).unwrap();

        assert!(after.is_subset(&before));
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn test_version_conflict() {
        let survey = survey(&[
            ("org.astro", "a", Some("1")),
            ("org.astro", "b", Some("2")),
            ("org.astro", "c", None),
            ("junit", "a", Some("4.13")),
            ("junit", "b", Some("4.13")),
        ]);
        assert!(matches!(
            survey.version("org.astro"),
            Err(ResolutionError::VersionConflict { requirements, .. }) if requirements.len() == 2
        ));
        assert_eq!(survey.version("junit").unwrap().as_deref(), Some("4.13"));
        assert_eq!(survey.required_by("org.astro"), vec!["a", "b", "c"]);
    }

    fn patched(main: &str, test: &str) -> Survey {
        let fixture = ProjectFixture::new("patched")
            .with_module("src/foo/main/java", &format!("module foo {{ {} }}", main))
            .with_module("src/foo/test/java", &format!("open module foo {{ {} }}", test));
        let project = Scanner::new(fixture.path()).unwrap().scan().unwrap();
        Survey::of(&project)
    }

    #[test]
    fn test_patched_module_pins_conflict() {
        let survey = patched("requires x /*1*/;", "requires x /*2*/;");
        match survey.version("x") {
            Err(ResolutionError::VersionConflict { requirements, .. }) => assert_eq!(
                requirements,
                vec![
                    ("main/foo".to_string(), "1".to_string()),
                    ("test/foo".to_string(), "2".to_string())
                ]
            ),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(survey.required_by("x"), vec!["foo"]);
    }

    #[test]
    fn test_patched_module_keeps_pin_of_other_unit() {
        let survey = patched("requires x /*1*/;", "requires x;");
        assert_eq!(survey.version("x").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_detect_system_modules() {
        let runner = MockToolRunner::new().with_output(
            "java",
            ToolOutput::success("java.base@21.0.1\njava.logging@21.0.1\n"),
        );
        let system = SystemModules::detect(&runner);
        assert_eq!(system.len(), 2);
        assert!(system.contains("java.logging"));
    }

    #[test]
    fn test_detect_falls_back_to_builtin() {
        let runner = MockToolRunner::new().with_output("java", ToolOutput::failure(1, "boom"));
        assert_eq!(SystemModules::detect(&runner), SystemModules::builtin());
    }
}

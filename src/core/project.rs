//! Project - the root of the build model.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::core::paths::ProjectPaths;
use crate::core::space::Space;
use crate::core::unit::ModuleUnit;

/// Version used when neither the manifest nor the caller provides one.
pub const DEFAULT_VERSION: &str = "0-ea";

/// Name and version of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
}

impl ProjectInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ProjectInfo {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Derive a project name from a directory name.
    ///
    /// Spaces, dashes and underscores become dots; `None` for a path without
    /// a final component.
    pub fn name_of(dir: &Path) -> Option<String> {
        let name = dir.file_name()?.to_str()?;
        Some(name.replace([' ', '-', '_'], "."))
    }
}

/// Configuration of external modules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibrarySettings {
    /// Module names required in addition to those of the declarations
    pub requires: BTreeSet<String>,

    /// Direct `module -> location` links
    pub links: BTreeMap<String, String>,

    /// `module -> group:artifact:version[:classifier]` coordinates
    pub maven: BTreeMap<String, String>,

    /// Replacement for the built-in system module names
    pub system: Option<BTreeSet<String>>,
}

/// A fully scanned project.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    info: ProjectInfo,
    #[serde(skip)]
    paths: ProjectPaths,
    spaces: Vec<Space>,
    library: LibrarySettings,
}

impl Project {
    /// Create a project from already validated spaces.
    pub fn new(info: ProjectInfo, paths: ProjectPaths, spaces: Vec<Space>) -> Self {
        Project {
            info,
            paths,
            spaces,
            library: LibrarySettings::default(),
        }
    }

    /// Replace the library settings.
    pub fn with_library(mut self, library: LibrarySettings) -> Self {
        self.library = library;
        self
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn version(&self) -> &str {
        &self.info.version
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn library(&self) -> &LibrarySettings {
        &self.library
    }

    /// Spaces in build order (upstreams first).
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    /// Look up a space by name.
    pub fn space(&self, name: &str) -> Option<&Space> {
        self.spaces.iter().find(|space| space.name() == name)
    }

    /// Upstream spaces of a space, in declared order.
    pub fn upstreams_of<'a>(&'a self, space: &'a Space) -> impl Iterator<Item = &'a Space> + 'a {
        space
            .upstreams()
            .iter()
            .filter_map(move |name| self.space(name))
    }

    /// All units of all spaces, paired with their space.
    pub fn units(&self) -> impl Iterator<Item = (&Space, &ModuleUnit)> {
        self.spaces
            .iter()
            .flat_map(|space| space.units().values().map(move |unit| (space, unit)))
    }

    /// Names of all modules declared in any space.
    pub fn declared_module_names(&self) -> BTreeSet<String> {
        self.units()
            .map(|(_, unit)| unit.name().to_string())
            .collect()
    }

    /// Names of all modules required by any declaration or by the library settings.
    pub fn required_module_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .units()
            .flat_map(|(_, unit)| unit.descriptor.required_names())
            .map(str::to_string)
            .collect();
        names.extend(self.library.requires.iter().cloned());
        names
    }
}

/// Amend well-known test-engine and launcher modules implied by required names.
pub fn amend_conventions(modules: &mut BTreeSet<String>) {
    if modules.contains("org.junit.jupiter") || modules.contains("org.junit.jupiter.api") {
        modules.insert("org.junit.jupiter.engine".to_string());
    }
    if modules.contains("junit") {
        modules.insert("org.junit.vintage.engine".to_string());
    }
    let engines = [
        "org.junit.jupiter.engine",
        "org.junit.vintage.engine",
        "org.junit.platform.engine",
    ];
    if engines.iter().any(|engine| modules.contains(*engine)) {
        modules.insert("org.junit.platform.console".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{ModuleDescriptor, Requires};
    use crate::core::space::{MAIN, TEST};

    fn unit(name: &str, requires: &[&str]) -> ModuleUnit {
        let descriptor = requires
            .iter()
            .fold(ModuleDescriptor::new(name), |d, r| d.with_requires(Requires::new(*r)));
        ModuleUnit::of(format!("src/{}/module-info.java", name), descriptor)
    }

    #[test]
    fn test_name_of_directory() {
        assert_eq!(
            ProjectInfo::name_of(Path::new("/work/my-fancy_project x")).as_deref(),
            Some("my.fancy.project.x")
        );
    }

    #[test]
    fn test_declared_and_required() {
        let main = Space::new(MAIN)
            .with_unit(unit("com.greetings", &["org.astro"]))
            .unwrap()
            .with_unit(unit("org.astro", &[]))
            .unwrap();
        let test = Space::new(TEST)
            .with_upstreams([MAIN])
            .with_unit(unit("test.modules", &["org.astro", "org.junit.jupiter"]))
            .unwrap();
        let project = Project::new(
            ProjectInfo::new("demo", DEFAULT_VERSION),
            ProjectPaths::new("/tmp/demo"),
            vec![main, test],
        );

        let declared: Vec<_> = project.declared_module_names().into_iter().collect();
        assert_eq!(declared, vec!["com.greetings", "org.astro", "test.modules"]);

        let required: Vec<_> = project.required_module_names().into_iter().collect();
        assert_eq!(required, vec!["org.astro", "org.junit.jupiter"]);

        let test = project.space(TEST).unwrap();
        let upstreams: Vec<_> = project.upstreams_of(test).map(|s| s.name()).collect();
        assert_eq!(upstreams, vec![MAIN]);
    }

    #[test]
    fn test_amend_conventions_empty_stays_empty() {
        let mut modules = BTreeSet::new();
        amend_conventions(&mut modules);
        assert!(modules.is_empty());
    }

    #[test]
    fn test_amend_conventions_jupiter() {
        let mut modules: BTreeSet<String> = ["org.junit.jupiter.api".to_string()].into();
        amend_conventions(&mut modules);
        assert!(modules.contains("org.junit.jupiter.engine"));
        assert!(modules.contains("org.junit.platform.console"));
    }

    #[test]
    fn test_amend_conventions_vintage() {
        let mut modules: BTreeSet<String> = ["junit".to_string()].into();
        amend_conventions(&mut modules);
        assert!(modules.contains("org.junit.vintage.engine"));
        assert!(modules.contains("org.junit.platform.console"));
    }
}

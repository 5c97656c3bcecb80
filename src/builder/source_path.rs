//! Module source paths and patch mappings.
//!
//! A unit whose source folder contains its module name as exactly one path
//! segment shares a wildcard pattern (`src/*/main/java`) with all units of
//! the same structure. Every other unit is named explicitly
//! (`name=path[:path]`).

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::core::project::Project;
use crate::core::space::Space;
use crate::core::unit::ModuleUnit;
use crate::scanner::layout::LayoutError;

/// Platform path list separator.
pub const PATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Wildcard standing in for the module name segment.
pub const WILDCARD: &str = "*";

/// Join paths into one platform path list.
pub fn join_paths<I, P>(paths: I) -> String
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .map(|p| p.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// Derive the pattern form of a source folder.
///
/// Returns `None` unless `module` occurs exactly once among the segments.
pub fn pattern_of(path: &Path, module: &str) -> Option<String> {
    let occurrences = path
        .components()
        .filter(|c| matches!(c, Component::Normal(s) if *s == OsStr::new(module)))
        .count();
    if occurrences != 1 {
        return None;
    }
    let pattern: PathBuf = path
        .components()
        .map(|c| match c {
            Component::Normal(s) if s == OsStr::new(module) => OsStr::new(WILDCARD),
            other => other.as_os_str(),
        })
        .collect();
    Some(pattern.display().to_string())
}

/// Module source path of one space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSourcePath {
    pub patterns: BTreeSet<String>,
    pub explicit: BTreeMap<String, Vec<PathBuf>>,
}

impl ModuleSourcePath {
    /// Values for `--module-source-path` options: the merged patterns first,
    /// then one entry per explicitly named module.
    pub fn to_values(&self) -> Vec<String> {
        let mut values = Vec::new();
        if !self.patterns.is_empty() {
            values.push(self.patterns.iter().cloned().collect::<Vec<_>>().join(PATH_SEPARATOR));
        }
        for (module, paths) in &self.explicit {
            values.push(format!("{}={}", module, join_paths(paths)));
        }
        values
    }
}

/// Computes module source paths and patch mappings for the spaces of a project.
pub struct SourcePathResolver<'a> {
    project: &'a Project,
}

impl<'a> SourcePathResolver<'a> {
    pub fn new(project: &'a Project) -> Self {
        SourcePathResolver { project }
    }

    /// Module source path of every unit in a space.
    pub fn module_source_path(&self, space: &Space) -> Result<ModuleSourcePath, LayoutError> {
        let mut result = ModuleSourcePath::default();
        for unit in space.units().values() {
            let paths = relevant_paths(unit)?;
            match paths.as_slice() {
                [single] => match pattern_of(single, unit.name()) {
                    Some(pattern) => {
                        result.patterns.insert(pattern);
                    }
                    None => {
                        tracing::debug!(
                            "module `{}` uses an explicit source path: {}",
                            unit.name(),
                            single.display()
                        );
                        result.explicit.insert(unit.name().to_string(), paths);
                    }
                },
                _ => {
                    result.explicit.insert(unit.name().to_string(), paths);
                }
            }
        }
        Ok(result)
    }

    /// Modules of `space` also present in one of its upstream spaces, mapped
    /// to the primary source folders of those upstream modules.
    pub fn patch_map(&self, space: &Space) -> BTreeMap<String, Vec<PathBuf>> {
        let mut patches: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for upstream in self.project.upstreams_of(space) {
            for module in space.module_names() {
                let source = upstream.unit(module).and_then(ModuleUnit::primary_source);
                if let Some(source) = source {
                    patches
                        .entry(module.to_string())
                        .or_default()
                        .push(source.to_path_buf());
                }
            }
        }
        patches
    }
}

fn relevant_paths(unit: &ModuleUnit) -> Result<Vec<PathBuf>, LayoutError> {
    unit.relevant_source_paths()
        .map(|paths| paths.into_iter().map(Path::to_path_buf).collect())
        .ok_or_else(|| LayoutError::NotDerivable {
            module: unit.name().to_string(),
        })
}

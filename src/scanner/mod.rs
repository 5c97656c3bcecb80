//! Project scanning.
//!
//! Walks a directory tree for module declarations, parses them and lays the
//! resulting units out in spaces.

pub mod declaration;
pub mod layout;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::core::graph::ModuleGraph;
use crate::core::manifest::ProjectManifest;
use crate::core::paths::ProjectPaths;
use crate::core::project::{LibrarySettings, Project, ProjectInfo, DEFAULT_VERSION};
use crate::core::space::{validate_chain, Space};
use crate::core::unit::{parse_release, ModuleUnit, SourceFolder, MODULE_INFO};

pub use declaration::{DeclarationParser, ParseError, RegexDeclarationParser};
pub use layout::{Assignment, LayoutError};

/// Default recursion limit of the declaration walk.
pub const DEFAULT_DEPTH: usize = 9;

/// Scans a project directory into a [`Project`].
pub struct Scanner {
    root: PathBuf,
    depth: usize,
    manifest: ProjectManifest,
    parser: Box<dyn DeclarationParser>,
}

impl Scanner {
    /// Create a scanner for a root directory, loading its manifest if present.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let manifest = ProjectManifest::find(&root)?;
        Ok(Scanner {
            root,
            depth: DEFAULT_DEPTH,
            manifest,
            parser: Box::new(RegexDeclarationParser),
        })
    }

    /// Set the recursion limit.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Replace the manifest.
    pub fn with_manifest(mut self, manifest: ProjectManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Replace the declaration parser.
    pub fn with_parser(mut self, parser: impl DeclarationParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    /// Find, parse and lay out all declarations.
    pub fn scan(&self) -> Result<Project> {
        let files = self.find_declarations()?;
        tracing::debug!("found {} declaration file(s)", files.len());
        if files.is_empty() {
            return Err(LayoutError::NoModules {
                root: self.root.clone(),
            }
            .into());
        }

        let assignments = layout::assign(&self.root, &files, &self.manifest)?;

        let descriptors = files
            .par_iter()
            .map(|file| self.parser.describe(file).map(|d| (file.clone(), d)))
            .collect::<Result<BTreeMap<_, _>, ParseError>>()?;

        let mut spaces = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let mut space = Space::new(&assignment.space)
                .with_upstreams(assignment.upstreams)
                .with_flags(assignment.flags)
                .with_release(assignment.release);
            for file in collapse_multi_release(&assignment.files) {
                let Some(descriptor) = descriptors.get(&file) else {
                    continue;
                };
                let unit = unit_of(&file, descriptor.clone());
                tracing::debug!("{}: module {}", assignment.space, unit.name());
                space = space.with_unit(unit).map_err(LayoutError::from)?;
            }
            spaces.push(space);
        }
        validate_chain(&spaces).map_err(LayoutError::from)?;

        let project = Project::new(self.info(), self.paths(), spaces).with_library(self.library());

        if let Some(cycle) = ModuleGraph::of(&project).cycles().into_iter().next() {
            return Err(LayoutError::Cycle { modules: cycle }.into());
        }
        Ok(project)
    }

    fn find_declarations(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .max_depth(self.depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
        for entry in walker {
            let entry =
                entry.with_context(|| format!("failed to walk {}", self.root.display()))?;
            if entry.file_type().is_file() && entry.file_name() == MODULE_INFO {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn info(&self) -> ProjectInfo {
        let name = self
            .manifest
            .project
            .name
            .clone()
            .or_else(|| ProjectInfo::name_of(&self.root))
            .or_else(|| {
                std::env::current_dir()
                    .ok()
                    .and_then(|cwd| ProjectInfo::name_of(&cwd))
            })
            .unwrap_or_else(|| "project".to_string());
        let version = self
            .manifest
            .project
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        ProjectInfo::new(name, version)
    }

    fn paths(&self) -> ProjectPaths {
        let paths = ProjectPaths::new(&self.root);
        match &self.manifest.library.directory {
            Some(lib) => paths.with_lib(lib),
            None => paths,
        }
    }

    fn library(&self) -> LibrarySettings {
        let library = &self.manifest.library;
        LibrarySettings {
            requires: library.requires.iter().cloned().collect(),
            links: library.links.clone(),
            maven: library.maven.clone(),
            system: library
                .system
                .as_ref()
                .map(|names| names.iter().cloned().collect()),
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Keep one declaration per group of `java-N` sibling folders.
///
/// The declaration of the lowest release wins.
fn collapse_multi_release(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen: BTreeMap<PathBuf, (u32, PathBuf)> = BTreeMap::new();
    let mut result = Vec::new();
    for file in files {
        let Some(folder) = file.parent() else {
            continue;
        };
        match (parse_release(folder), folder.parent()) {
            (Some(release), Some(group)) => {
                let entry = seen
                    .entry(group.to_path_buf())
                    .or_insert_with(|| (release, file.clone()));
                if release < entry.0 {
                    *entry = (release, file.clone());
                }
            }
            _ => result.push(file.clone()),
        }
    }
    result.extend(seen.into_values().map(|(_, file)| file));
    result.sort();
    result
}

/// Build the unit of a declaration, collecting sibling folders.
fn unit_of(info: &Path, descriptor: crate::core::descriptor::ModuleDescriptor) -> ModuleUnit {
    let mut unit = ModuleUnit::of(info, descriptor);
    let Some(folder) = info.parent() else {
        return unit;
    };
    let Some(group) = folder.parent() else {
        return unit;
    };

    if parse_release(folder).is_some() {
        let mut versions: Vec<(u32, PathBuf)> = std::fs::read_dir(group)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| parse_release(&path).map(|release| (release, path)))
            .collect();
        versions.sort();
        unit.sources = versions
            .into_iter()
            .enumerate()
            .map(|(index, (_, path))| {
                let folder = SourceFolder::of(path);
                if index == 0 {
                    folder
                } else {
                    folder.versioned()
                }
            })
            .collect();
    }

    let resources = group.join("resources");
    if resources.is_dir() {
        unit.resources.push(resources);
    }
    unit
}

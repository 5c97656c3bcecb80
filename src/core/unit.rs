//! Module units - a declaration plus its source and resource folders.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::descriptor::ModuleDescriptor;

/// File name of a module declaration compilation unit.
pub const MODULE_INFO: &str = "module-info.java";

/// A folder containing source files of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFolder {
    /// Folder path
    pub path: PathBuf,

    /// Target release parsed from a `java-N` folder name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<u32>,

    /// Whether this folder holds versioned (multi-release) sources
    #[serde(default)]
    pub versioned: bool,
}

impl SourceFolder {
    /// Create an unversioned source folder, parsing the release from its name.
    pub fn of(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let release = parse_release(&path);
        SourceFolder {
            path,
            release,
            versioned: false,
        }
    }

    /// Mark this folder as versioned.
    pub fn versioned(mut self) -> Self {
        self.versioned = true;
        self
    }

    /// Check if this folder directly contains a module declaration.
    pub fn is_module_info_present(&self) -> bool {
        self.path.join(MODULE_INFO).is_file()
    }
}

/// Parse `N` from a folder named `java-N`.
pub fn parse_release(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("java-")?
        .parse()
        .ok()
}

/// A module declaration together with its folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleUnit {
    /// Path of the declaration file
    pub info: PathBuf,

    /// Parsed declaration
    pub descriptor: ModuleDescriptor,

    /// Source folders; the first one is the base folder
    pub sources: Vec<SourceFolder>,

    /// Resource folders
    #[serde(default)]
    pub resources: Vec<PathBuf>,
}

impl ModuleUnit {
    /// Create a unit with a single source folder: the declaration's parent.
    pub fn of(info: impl Into<PathBuf>, descriptor: ModuleDescriptor) -> Self {
        let info = info.into();
        let sources = info
            .parent()
            .map(|parent| vec![SourceFolder::of(parent)])
            .unwrap_or_default();
        ModuleUnit {
            info,
            descriptor,
            sources,
            resources: Vec::new(),
        }
    }

    /// Module name.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The base source folder.
    pub fn primary_source(&self) -> Option<&Path> {
        self.sources.first().map(|s| s.path.as_path())
    }

    /// Source folders relevant for locating the module's compilation units.
    ///
    /// This is the base folder alone if it holds the declaration (or is the
    /// only folder), otherwise the base folder followed by the first folder
    /// that holds the declaration. Returns `None` for a unit without any
    /// folder that holds its declaration.
    pub fn relevant_source_paths(&self) -> Option<Vec<&Path>> {
        let base = self.sources.first()?;
        if self.sources.len() == 1 || base.is_module_info_present() {
            return Some(vec![base.path.as_path()]);
        }
        self.sources
            .iter()
            .skip(1)
            .find(|source| source.is_module_info_present())
            .map(|source| vec![base.path.as_path(), source.path.as_path()])
    }
}

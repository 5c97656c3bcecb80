//! `dockyard.toml` project manifest.
//!
//! The manifest is optional. Everything it configures has a convention
//! derived from the directory layout; the manifest only overrides.
//!
//! ```toml
//! [project]
//! name = "demo"
//! version = "1.0"
//!
//! [library]
//! directory = "lib"
//! requires = ["org.junit.platform.console"]
//!
//! [library.links]
//! junit = "https://repo.maven.apache.org/maven2/junit/junit/4.13/junit-4.13.jar"
//!
//! [library.maven]
//! "org.hamcrest" = "org.hamcrest:hamcrest:2.2"
//!
//! [[space]]
//! name = "main"
//! docs = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::space::SpaceFlags;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "dockyard.toml";

/// Parsed `dockyard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectManifest {
    /// Project metadata
    pub project: ProjectSection,

    /// External module configuration
    pub library: LibrarySection,

    /// Space overrides or explicit space definitions, in order
    #[serde(rename = "space", skip_serializing_if = "Vec::is_empty")]
    pub spaces: Vec<SpaceSection>,
}

/// `[project]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// `[library]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySection {
    /// Library directory, relative to the project root
    pub directory: Option<PathBuf>,

    /// Additional required module names
    pub requires: Vec<String>,

    /// Direct `module -> location` links
    pub links: BTreeMap<String, String>,

    /// `module -> group:artifact:version[:classifier]` coordinates
    pub maven: BTreeMap<String, String>,

    /// Replacement for the built-in system module names
    pub system: Option<Vec<String>>,
}

/// `[[space]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceSection {
    pub name: String,
    pub upstreams: Option<Vec<String>>,
    pub release: Option<u32>,
    pub docs: Option<bool>,
    pub image: Option<bool>,
    pub preview: Option<bool>,
    pub include_sources: Option<bool>,

    /// Glob patterns selecting declaration files (explicit assignment)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

impl SpaceSection {
    /// Apply the flags set in this section on top of `flags`.
    pub fn apply(&self, mut flags: SpaceFlags) -> SpaceFlags {
        if let Some(docs) = self.docs {
            flags.docs = docs;
        }
        if let Some(image) = self.image {
            flags.image = image;
        }
        if let Some(preview) = self.preview {
            flags.preview = preview;
        }
        if let Some(include_sources) = self.include_sources {
            flags.include_sources = include_sources;
        }
        flags
    }
}

impl ProjectManifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load `<root>/dockyard.toml`, or return an empty manifest if it is absent.
    pub fn find(root: &Path) -> Result<Self> {
        let path = root.join(MANIFEST_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Whether spaces are assigned explicitly by path globs.
    pub fn is_explicit(&self) -> bool {
        self.spaces.iter().any(|space| !space.paths.is_empty())
    }

    /// Find the section configuring a space.
    pub fn space(&self, name: &str) -> Option<&SpaceSection> {
        self.spaces.iter().find(|space| space.name == name)
    }
}

//! Core data structures for dockyard.
//!
//! This module contains the build model:
//! - Module descriptors and units
//! - Spaces and their upstream chain
//! - The project, its manifest and its directory layout

pub mod descriptor;
pub mod graph;
pub mod manifest;
pub mod paths;
pub mod project;
pub mod space;
pub mod unit;

pub use descriptor::{ModuleDescriptor, Requires, RequiresModifier};
pub use graph::ModuleGraph;
pub use manifest::{ProjectManifest, MANIFEST_NAME};
pub use paths::ProjectPaths;
pub use project::{LibrarySettings, Project, ProjectInfo};
pub use space::{Space, SpaceError, SpaceFlags};
pub use unit::{ModuleUnit, SourceFolder, MODULE_INFO};

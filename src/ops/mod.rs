//! High-level operations.
//!
//! This module contains the implementation of dockyard commands.

pub mod build;
pub mod clean;
pub mod grab;
pub mod resolve;
pub mod scan;
pub mod tree;

pub use build::{build, plan, warnings, BuildOptions, MessageFormat};
pub use clean::clean;
pub use grab::grab_file;
pub use resolve::{resolve, ResolveOptions};
pub use scan::{report, scan_project, Session};
pub use tree::tree;

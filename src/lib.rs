//! Dockyard - a build orchestrator for modular Java projects
//!
//! This crate provides the core library functionality for Dockyard:
//! scanning module declarations into spaces, resolving external modules,
//! and planning and executing the JDK tool runs that build each space.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod scanner;
pub mod sources;
pub mod util;

/// Test utilities and mocks for Dockyard unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations for tool execution and
/// HTTP operations, plus project fixtures on disk.
#[cfg(test)]
pub mod test_support;

pub use core::{
    descriptor::ModuleDescriptor, project::Project, space::Space, unit::ModuleUnit,
};

pub use builder::{BuildPlan, BuildSequencer};
pub use resolver::ExternalModuleResolver;
pub use scanner::Scanner;
pub use util::context::GlobalContext;

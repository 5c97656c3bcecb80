//! Build planning and execution.
//!
//! This module turns a scanned project into ordered tool invocations and
//! runs them.

pub mod arguments;
pub mod events;
pub mod executor;
pub mod plan;
pub mod source_path;

pub use arguments::Arguments;
pub use events::{BuildEvent, Recorder, TaskRecord};
pub use executor::{Executor, ProcessToolRunner, ToolExecutionError, ToolOutput, ToolRunner};
pub use plan::{BuildPlan, BuildSequencer, BuildTask, PlanError, PlanOptions, Stage, TaskKind};
pub use source_path::{ModuleSourcePath, SourcePathResolver};

//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod grab;
pub mod plan;
pub mod resolve;
pub mod scan;
pub mod tree;

use anyhow::Result;

use dockyard::builder::ProcessToolRunner;
use dockyard::ops::Session;
use dockyard::util::GlobalContext;

/// Open the project containing the working directory.
pub fn open_session(ctx: &GlobalContext) -> Result<Session> {
    let root = ctx.project_root();
    let runner = ProcessToolRunner::new().with_cwd(&root);
    Session::open(ctx, &root, &runner)
}

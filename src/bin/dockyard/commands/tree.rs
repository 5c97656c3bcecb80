//! `dockyard tree` command

use anyhow::Result;

use dockyard::ops::{scan_project, tree};
use dockyard::util::GlobalContext;

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let project = scan_project(&ctx.project_root())?;
    print!("{}", tree(&project));
    Ok(())
}

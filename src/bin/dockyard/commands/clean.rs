//! `dockyard clean` command

use anyhow::Result;

use dockyard::core::ProjectPaths;
use dockyard::ops::clean;
use dockyard::util::GlobalContext;

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let paths = ProjectPaths::new(ctx.project_root());

    if clean(&paths)? {
        eprintln!("     Removed {}", paths.out().display());
    }
    Ok(())
}

//! `dockyard resolve` command

use anyhow::Result;

use crate::cli::ResolveArgs;
use dockyard::ops::{resolve, ResolveOptions};
use dockyard::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: ResolveArgs) -> Result<()> {
    let session = super::open_session(ctx)?;
    let resolved = resolve(ctx, &session, &ResolveOptions { offline: args.offline })?;
    if resolved.is_empty() {
        eprintln!("    Finished nothing to resolve");
    } else {
        eprintln!("    Finished resolving {} module(s)", resolved.len());
    }
    Ok(())
}

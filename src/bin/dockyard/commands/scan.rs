//! `dockyard scan` command

use anyhow::Result;

use dockyard::ops::report;
use dockyard::util::GlobalContext;

pub fn execute(ctx: &GlobalContext) -> Result<()> {
    let session = super::open_session(ctx)?;
    print!("{}", report(&session)?);
    Ok(())
}

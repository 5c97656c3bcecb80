//! `dockyard plan` command

use anyhow::Result;

use crate::cli::PlanArgs;
use dockyard::ops::{plan, warnings};
use dockyard::util::diagnostic::emit;
use dockyard::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: PlanArgs) -> Result<()> {
    let session = super::open_session(ctx)?;
    for warning in warnings(&session.project) {
        emit(&warning, ctx.color());
    }
    let plan = plan(&session)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", plan.render());
    }
    Ok(())
}

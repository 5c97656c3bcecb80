//! `dockyard build` command

use anyhow::Result;

use crate::cli::{BuildArgs, MessageFormatArg};
use dockyard::builder::ProcessToolRunner;
use dockyard::ops::{build, warnings, BuildOptions, MessageFormat};
use dockyard::util::diagnostic::emit;
use dockyard::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: BuildArgs) -> Result<()> {
    let session = super::open_session(ctx)?;
    for warning in warnings(&session.project) {
        emit(&warning, ctx.color());
    }
    let runner = ProcessToolRunner::new().with_cwd(session.project.paths().root());

    let opts = BuildOptions {
        jobs: args.jobs,
        // CLI overrides config only when given
        fail_fast: args.no_fail_fast.then_some(false),
        offline: args.offline,
        verbose: ctx.is_verbose(),
        message_format: match args.message_format {
            MessageFormatArg::Human => MessageFormat::Human,
            MessageFormatArg::Json => MessageFormat::Json,
        },
    };

    build(ctx, &session, &opts, &runner)?;
    Ok(())
}

//! `dockyard grab` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::GrabArgs;
use dockyard::ops::grab_file;
use dockyard::sources::grab::GrabOutcome;
use dockyard::sources::{HttpClient, OfflineClient, ReqwestClient};
use dockyard::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: GrabArgs) -> Result<()> {
    let root = ctx.project_root();
    let config = ctx.config(&root);
    let client: Arc<dyn HttpClient> = if args.offline || config.net.offline {
        Arc::new(OfflineClient)
    } else {
        Arc::new(ReqwestClient::new(config.timeout())?)
    };

    let file = ctx.cwd().join(&args.file);
    let base = file.parent().map(|p| p.to_path_buf()).unwrap_or(root);

    for outcome in grab_file(client.as_ref(), &file, &base)? {
        match outcome {
            GrabOutcome::Written(path) => eprintln!("     Written {}", path.display()),
            GrabOutcome::Skipped(path) => eprintln!("     Skipped {}", path.display()),
        }
    }
    Ok(())
}

//! Implementation of `dockyard resolve`.

use std::sync::Arc;

use anyhow::Result;

use crate::ops::scan::Session;
use crate::resolver::{default_chain, ChainSettings, ExternalModuleResolver, Resolved};
use crate::sources::download::DownloadOutcome;
use crate::sources::http::{HttpClient, OfflineClient, ReqwestClient};
use crate::util::GlobalContext;

/// Options for the resolve command.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Never touch the network
    pub offline: bool,
}

/// Create the HTTP client for a session.
pub fn http_client(session: &Session, offline: bool) -> Result<Arc<dyn HttpClient>> {
    if offline || session.config.net.offline {
        return Ok(Arc::new(OfflineClient));
    }
    Ok(Arc::new(ReqwestClient::new(session.config.timeout())?))
}

/// Create the resolver of a session.
pub fn build_resolver(
    ctx: &GlobalContext,
    session: &Session,
    client: Arc<dyn HttpClient>,
    offline: bool,
) -> ExternalModuleResolver {
    let cache_dir = ctx.registry_cache_dir();
    let offline = offline || session.config.net.offline;
    let settings = ChainSettings {
        library: session.project.library(),
        maven_repository: session.config.maven_repository(),
        registry_url: session.config.registry_url(),
        cache_dir: &cache_dir,
        offline,
    };
    let chain = default_chain(&settings, Arc::clone(&client));
    tracing::debug!("locator chain: {:?}", chain);
    ExternalModuleResolver::new(chain, client)
}

/// Resolve all missing modules of a session into its library directory.
pub fn resolve(ctx: &GlobalContext, session: &Session, opts: &ResolveOptions) -> Result<Vec<Resolved>> {
    if session.missing()?.is_empty() {
        tracing::debug!("no missing modules");
        return Ok(Vec::new());
    }
    let client = http_client(session, opts.offline)?;
    let resolver = build_resolver(ctx, session, client, opts.offline);
    let resolved = resolver.resolve(&session.context, &session.survey)?;

    for module in &resolved {
        match module.outcome {
            DownloadOutcome::Fetched(bytes) => eprintln!(
                "  Downloaded {} ({} bytes) via {}",
                module.module, bytes, module.locator
            ),
            DownloadOutcome::Present => eprintln!("     Fresh {}", module.module),
        }
    }
    Ok(resolved)
}

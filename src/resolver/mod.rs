//! External module resolution.
//!
//! Missing modules are mapped to locations by an ordered [`LocatorChain`]
//! and downloaded into the library directory. Resolution runs in rounds:
//! every round recomputes the missing set from the library directory, so a
//! module already present is never located or fetched again.

pub mod errors;
pub mod github;
pub mod locator;
pub mod missing;
pub mod registry;

pub use errors::{ResolutionError, Unresolved};
pub use locator::{DirectMap, Locator, LocatorChain, MavenCoordinates, MavenLocator};
pub use missing::{ResolutionContext, Survey, SystemModules};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::core::project::LibrarySettings;
use crate::resolver::github::GitHubLocator;
use crate::resolver::registry::RegistryLocator;
use crate::sources::download::{download, DownloadOutcome};
use crate::sources::http::HttpClient;

/// Settings used to assemble the default locator chain.
#[derive(Debug, Clone)]
pub struct ChainSettings<'a> {
    pub library: &'a LibrarySettings,
    pub maven_repository: &'a str,
    pub registry_url: &'a str,
    pub cache_dir: &'a Path,
    pub offline: bool,
}

/// Build the locator chain: direct links, Maven coordinates, GitHub
/// releases, then the remote registry.
///
/// The network-scraping locators are left out when offline.
pub fn default_chain(settings: &ChainSettings<'_>, client: Arc<dyn HttpClient>) -> LocatorChain {
    let chain = LocatorChain::new()
        .with("links", DirectMap::new(settings.library.links.clone()))
        .with(
            "maven",
            MavenLocator::new(settings.maven_repository).with_all(&settings.library.maven),
        );
    if settings.offline {
        return chain;
    }
    chain
        .with("github", GitHubLocator::new(Arc::clone(&client)))
        .with(
            "registry",
            RegistryLocator::new(
                settings.registry_url,
                settings.maven_repository,
                settings.cache_dir,
                client,
            ),
        )
}

/// A module fetched into the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub module: String,
    pub location: String,
    pub locator: String,
    pub path: PathBuf,
    pub outcome: DownloadOutcome,
}

/// Resolves missing external modules into the library directory.
pub struct ExternalModuleResolver {
    chain: LocatorChain,
    client: Arc<dyn HttpClient>,
}

impl ExternalModuleResolver {
    pub fn new(chain: LocatorChain, client: Arc<dyn HttpClient>) -> Self {
        ExternalModuleResolver { chain, client }
    }

    pub fn chain(&self) -> &LocatorChain {
        &self.chain
    }

    /// Locate a single module.
    pub fn locate(&self, module: &str) -> Option<String> {
        self.chain.locate(module)
    }

    /// Resolve every missing module of a survey.
    ///
    /// Unlocatable modules are reported together, before anything is
    /// downloaded.
    pub fn resolve(
        &self,
        context: &ResolutionContext,
        survey: &Survey,
    ) -> Result<Vec<Resolved>, ResolutionError> {
        let mut attempted: BTreeSet<String> = BTreeSet::new();
        let mut resolved = Vec::new();

        loop {
            let missing = context.missing(survey)?;
            if missing.is_empty() {
                return Ok(resolved);
            }

            let still: Vec<String> = missing.intersection(&attempted).cloned().collect();
            if !still.is_empty() {
                return Err(survey.unresolved(still));
            }
            tracing::info!("Resolving {} missing module(s)", missing.len());

            let mut targets = Vec::with_capacity(missing.len());
            let mut unlocated = Vec::new();
            for module in &missing {
                let version = survey.version(module)?;
                match self.chain.locate_named(module) {
                    Some((locator, location)) => {
                        let path = context.library().jar_path(module, version.as_deref());
                        targets.push((module.clone(), locator.to_string(), location, path));
                    }
                    None => unlocated.push(module.clone()),
                }
            }
            if !unlocated.is_empty() {
                return Err(survey.unresolved(unlocated));
            }

            let results: Vec<Result<Resolved, (String, String)>> = targets
                .into_par_iter()
                .map(|(module, locator, location, path)| {
                    match download(self.client.as_ref(), &location, &path) {
                        Ok(outcome) => Ok(Resolved {
                            module,
                            location,
                            locator,
                            path,
                            outcome,
                        }),
                        Err(e) => Err((module, format!("{:#}", e))),
                    }
                })
                .collect();

            let mut failures = Vec::new();
            for result in results {
                match result {
                    Ok(module) => resolved.push(module),
                    Err(failure) => failures.push(failure),
                }
            }
            if !failures.is_empty() {
                return Err(ResolutionError::Download { failures });
            }
            attempted.extend(missing);
        }
    }
}

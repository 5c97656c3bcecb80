//! Remote module registry.
//!
//! The registry consists of two property files:
//! - `module-maven.properties`: `module = group:artifact`
//! - `module-version.properties`: `module = version`
//!
//! Both are fetched once per locator into a user-scoped cache directory. If a
//! fetch fails, the cached copy is used.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::resolver::locator::{Locator, MavenCoordinates};
use crate::sources::http::HttpClient;
use crate::util::fs::{read_to_string, write_string};

/// File mapping module names to `group:artifact`.
pub const MAVEN_PROPERTIES: &str = "module-maven.properties";

/// File mapping module names to versions.
pub const VERSION_PROPERTIES: &str = "module-version.properties";

#[derive(Debug, Default)]
struct Tables {
    maven: BTreeMap<String, String>,
    version: BTreeMap<String, String>,
}

/// Locator backed by the registry property files.
pub struct RegistryLocator {
    base_url: String,
    repository: String,
    cache_dir: PathBuf,
    client: Arc<dyn HttpClient>,
    tables: OnceLock<Tables>,
}

impl RegistryLocator {
    /// Create a locator fetching from `base_url` and pointing into `repository`.
    pub fn new(
        base_url: impl Into<String>,
        repository: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
        client: Arc<dyn HttpClient>,
    ) -> Self {
        RegistryLocator {
            base_url: base_url.into(),
            repository: repository.into(),
            cache_dir: cache_dir.into(),
            client,
            tables: OnceLock::new(),
        }
    }

    fn tables(&self) -> &Tables {
        self.tables.get_or_init(|| Tables {
            maven: self.load(MAVEN_PROPERTIES),
            version: self.load(VERSION_PROPERTIES),
        })
    }

    fn load(&self, file: &str) -> BTreeMap<String, String> {
        let cached = self.cache_dir.join(file);
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), file);
        match self.client.get_text(&url) {
            Ok(Some(text)) => {
                if let Err(e) = write_string(&cached, &text) {
                    tracing::warn!("failed to cache {}: {:#}", file, e);
                }
                return parse_properties(&text);
            }
            Ok(None) => tracing::warn!("registry file {} not found", url),
            Err(e) => tracing::warn!("failed to fetch {}: {:#}", url, e),
        }
        match read_to_string(&cached) {
            Ok(text) => {
                tracing::debug!("using cached {}", cached.display());
                parse_properties(&text)
            }
            Err(_) => BTreeMap::new(),
        }
    }

    /// Coordinates of a module, if the registry knows both its artifact and version.
    pub fn coordinates(&self, module: &str) -> Option<MavenCoordinates> {
        let tables = self.tables();
        let artifact = tables.maven.get(module)?;
        let version = tables.version.get(module)?;
        MavenCoordinates::parse(&format!("{}:{}", artifact, version))
    }
}

impl Locator for RegistryLocator {
    fn locate(&self, module: &str) -> Option<String> {
        self.coordinates(module)
            .map(|coordinates| coordinates.url(&self.repository))
    }
}

/// Parse the subset of the properties format used by the registry.
///
/// Keys end at the first `=`, `:` or whitespace; `#` and `!` start comments.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let end = line.find(|c: char| c == '=' || c == ':' || c.is_whitespace())?;
            let (key, rest) = line.split_at(end);
            let rest = rest.trim_start();
            let value = rest
                .strip_prefix('=')
                .or_else(|| rest.strip_prefix(':'))
                .unwrap_or(rest)
                .trim();
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

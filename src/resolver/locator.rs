//! Locators map a module name to a fetchable location.
//!
//! A locator is any `Fn(&str) -> Option<String>`; locators are composed into
//! a [`LocatorChain`] where the first one returning a location wins.

use std::collections::BTreeMap;
use std::fmt;

/// A single resolution strategy.
pub trait Locator: Send + Sync {
    /// Locate a module, returning its location if known.
    fn locate(&self, module: &str) -> Option<String>;
}

impl<F> Locator for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn locate(&self, module: &str) -> Option<String> {
        self(module)
    }
}

/// Fixed `module -> location` table.
#[derive(Debug, Clone, Default)]
pub struct DirectMap {
    links: BTreeMap<String, String>,
}

impl DirectMap {
    pub fn new(links: BTreeMap<String, String>) -> Self {
        DirectMap { links }
    }

    /// Add a link.
    pub fn with(mut self, module: impl Into<String>, location: impl Into<String>) -> Self {
        self.links.insert(module.into(), location.into());
        self
    }
}

impl Locator for DirectMap {
    fn locate(&self, module: &str) -> Option<String> {
        self.links.get(module).cloned()
    }
}

/// `group:artifact:version[:classifier]` coordinates of a Maven artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenCoordinates {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
}

impl MavenCoordinates {
    /// Parse `group:artifact:version[:classifier]`.
    pub fn parse(coordinates: &str) -> Option<Self> {
        let parts: Vec<&str> = coordinates.trim().split(':').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return None;
        }
        let (group, artifact, version, classifier) = match parts.as_slice() {
            [g, a, v] => (*g, *a, *v, None),
            [g, a, v, c] => (*g, *a, *v, Some(c.to_string())),
            _ => return None,
        };
        Some(MavenCoordinates {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
            classifier,
        })
    }

    /// Artifact URL in a repository laid out the Maven way.
    pub fn url(&self, repository: &str) -> String {
        let classifier = self
            .classifier
            .as_ref()
            .map(|c| format!("-{}", c))
            .unwrap_or_default();
        format!(
            "{}/{}/{}/{}/{}-{}{}.jar",
            repository.trim_end_matches('/'),
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.artifact,
            self.version,
            classifier
        )
    }
}

impl fmt::Display for MavenCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

/// Locator for modules mapped to Maven coordinates.
#[derive(Debug, Clone)]
pub struct MavenLocator {
    repository: String,
    coordinates: BTreeMap<String, MavenCoordinates>,
}

impl MavenLocator {
    pub fn new(repository: impl Into<String>) -> Self {
        MavenLocator {
            repository: repository.into(),
            coordinates: BTreeMap::new(),
        }
    }

    /// Map a module to coordinates; unparsable coordinates are skipped with a warning.
    pub fn with(mut self, module: impl Into<String>, coordinates: &str) -> Self {
        let module = module.into();
        match MavenCoordinates::parse(coordinates) {
            Some(parsed) => {
                self.coordinates.insert(module, parsed);
            }
            None => tracing::warn!("ignoring malformed coordinates `{}` of {}", coordinates, module),
        }
        self
    }

    /// Add every `module -> coordinates` entry of a table.
    pub fn with_all(self, table: &BTreeMap<String, String>) -> Self {
        table
            .iter()
            .fold(self, |locator, (module, coordinates)| locator.with(module, coordinates))
    }
}

impl Locator for MavenLocator {
    fn locate(&self, module: &str) -> Option<String> {
        self.coordinates
            .get(module)
            .map(|coordinates| coordinates.url(&self.repository))
    }
}

struct Entry {
    name: String,
    locator: Box<dyn Locator>,
}

/// Ordered list of locators; the first match wins.
#[derive(Default)]
pub struct LocatorChain {
    entries: Vec<Entry>,
}

impl LocatorChain {
    pub fn new() -> Self {
        LocatorChain::default()
    }

    /// Append a locator with a display name.
    pub fn with(mut self, name: impl Into<String>, locator: impl Locator + 'static) -> Self {
        self.entries.push(Entry {
            name: name.into(),
            locator: Box::new(locator),
        });
        self
    }

    /// Names of the locators, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locate a module, returning the winning locator's name with the location.
    pub fn locate_named(&self, module: &str) -> Option<(&str, String)> {
        self.entries.iter().find_map(|entry| {
            let location = entry.locator.locate(module)?;
            tracing::debug!("{} located {} at {}", entry.name, module, location);
            Some((entry.name.as_str(), location))
        })
    }
}

impl Locator for LocatorChain {
    fn locate(&self, module: &str) -> Option<String> {
        self.locate_named(module).map(|(_, location)| location)
    }
}

impl fmt::Debug for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

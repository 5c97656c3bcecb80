//! Spaces - named groups of module units sharing a build policy.
//!
//! Spaces form a short chain: every upstream of a space must be defined
//! before it, so iterating spaces in definition order always visits
//! upstreams first.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::unit::ModuleUnit;

/// Name of the production space.
pub const MAIN: &str = "main";

/// Name of the test space.
pub const TEST: &str = "test";

/// Name of the test space compiled with preview language features.
pub const TEST_PREVIEW: &str = "test-preview";

/// Per-space feature flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceFlags {
    /// Generate API documentation
    pub docs: bool,

    /// Generate a custom runtime image
    pub image: bool,

    /// Enable preview language features
    pub preview: bool,

    /// Include source folders in module archives
    pub include_sources: bool,
}

/// Errors raised while assembling spaces.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpaceError {
    #[error("module `{module}` is declared more than once in space `{space}`")]
    DuplicateModule { space: String, module: String },

    #[error("space `{space}` is defined more than once")]
    DuplicateSpace { space: String },

    #[error("space `{space}` references upstream `{upstream}` which is not defined before it")]
    UnknownUpstream { space: String, upstream: String },
}

/// A named group of module units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    name: String,
    upstreams: Vec<String>,
    flags: SpaceFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    release: Option<u32>,
    units: BTreeMap<String, ModuleUnit>,
}

impl Space {
    /// Create an empty space without upstreams.
    pub fn new(name: impl Into<String>) -> Self {
        Space {
            name: name.into(),
            upstreams: Vec::new(),
            flags: SpaceFlags::default(),
            release: None,
            units: BTreeMap::new(),
        }
    }

    /// Set the upstream space names.
    pub fn with_upstreams<I, S>(mut self, upstreams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.upstreams = upstreams.into_iter().map(Into::into).collect();
        self
    }

    /// Set the feature flags.
    pub fn with_flags(mut self, flags: SpaceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the target release.
    pub fn with_release(mut self, release: Option<u32>) -> Self {
        self.release = release;
        self
    }

    /// Add a unit, failing if its module name is already taken.
    pub fn with_unit(mut self, unit: ModuleUnit) -> Result<Self, SpaceError> {
        let module = unit.name().to_string();
        if self.units.contains_key(&module) {
            return Err(SpaceError::DuplicateModule {
                space: self.name.clone(),
                module,
            });
        }
        self.units.insert(module, unit);
        Ok(self)
    }

    /// Space name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upstream space names, in order.
    pub fn upstreams(&self) -> &[String] {
        &self.upstreams
    }

    /// Feature flags.
    pub fn flags(&self) -> SpaceFlags {
        self.flags
    }

    /// Target release, if configured.
    pub fn release(&self) -> Option<u32> {
        self.release
    }

    /// Units keyed by module name.
    pub fn units(&self) -> &BTreeMap<String, ModuleUnit> {
        &self.units
    }

    /// Look up a unit.
    pub fn unit(&self, module: &str) -> Option<&ModuleUnit> {
        self.units.get(module)
    }

    /// Module names in this space, sorted.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Check if the space has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The module carrying the space's only main class, if exactly one does.
    pub fn main_module(&self) -> Option<&ModuleUnit> {
        let mut mains = self
            .units
            .values()
            .filter(|unit| unit.descriptor.main_class().is_some());
        let first = mains.next()?;
        if mains.next().is_some() {
            return None;
        }
        Some(first)
    }
}

/// Check that space names are unique and upstreams only point backwards.
pub fn validate_chain(spaces: &[Space]) -> Result<(), SpaceError> {
    let mut defined = HashSet::new();
    for space in spaces {
        for upstream in space.upstreams() {
            if !defined.contains(upstream.as_str()) {
                return Err(SpaceError::UnknownUpstream {
                    space: space.name().to_string(),
                    upstream: upstream.clone(),
                });
            }
        }
        if !defined.insert(space.name()) {
            return Err(SpaceError::DuplicateSpace {
                space: space.name().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::ModuleDescriptor;

    fn unit(name: &str) -> ModuleUnit {
        ModuleUnit::of(
            format!("src/{}/main/java/module-info.java", name),
            ModuleDescriptor::new(name),
        )
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let space = Space::new(MAIN).with_unit(unit("a")).unwrap();
        let err = space.with_unit(unit("a")).unwrap_err();
        assert_eq!(
            err,
            SpaceError::DuplicateModule {
                space: "main".into(),
                module: "a".into()
            }
        );
    }

    #[test]
    fn test_validate_chain_accepts_backward_references() {
        let spaces = vec![
            Space::new(MAIN),
            Space::new(TEST).with_upstreams([MAIN]),
            Space::new(TEST_PREVIEW).with_upstreams([MAIN, TEST]),
        ];
        assert!(validate_chain(&spaces).is_ok());
    }

    #[test]
    fn test_validate_chain_rejects_forward_reference() {
        let spaces = vec![Space::new(TEST).with_upstreams([MAIN]), Space::new(MAIN)];
        assert!(matches!(
            validate_chain(&spaces),
            Err(SpaceError::UnknownUpstream { .. })
        ));
    }

    #[test]
    fn test_validate_chain_rejects_self_reference() {
        let spaces = vec![Space::new(MAIN).with_upstreams([MAIN])];
        assert!(validate_chain(&spaces).is_err());
    }

    #[test]
    fn test_main_module_requires_exactly_one() {
        let app = ModuleUnit::of(
            "src/app/main/java/module-info.java",
            ModuleDescriptor::new("app").with_main_class("app.Main"),
        );
        let space = Space::new(MAIN)
            .with_unit(app)
            .unwrap()
            .with_unit(unit("lib"))
            .unwrap();
        assert_eq!(space.main_module().map(|u| u.name()), Some("app"));

        let tool = ModuleUnit::of(
            "src/tool/main/java/module-info.java",
            ModuleDescriptor::new("tool").with_main_class("tool.Main"),
        );
        let space = space.with_unit(tool).unwrap();
        assert!(space.main_module().is_none());
    }
}

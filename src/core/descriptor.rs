//! Module descriptors.
//!
//! A `ModuleDescriptor` is the structured form of a module declaration:
//! its name, the modules it requires (with an optional pinned version) and
//! an optional main class. Descriptors are immutable once built.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Modifier attached to a `requires` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiresModifier {
    /// `requires static` - mandatory at compile time, optional at run time
    Static,
    /// `requires transitive` - implied readability for downstream modules
    Transitive,
}

impl RequiresModifier {
    /// Parse a modifier keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "static" => Some(RequiresModifier::Static),
            "transitive" => Some(RequiresModifier::Transitive),
            _ => None,
        }
    }
}

/// A single `requires` directive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Requires {
    /// Name of the required module
    pub name: String,

    /// Version pinned by an inline `/* version */` comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Directive modifiers
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub modifiers: BTreeSet<RequiresModifier>,
}

impl Requires {
    /// Create an unversioned directive without modifiers.
    pub fn new(name: impl Into<String>) -> Self {
        Requires {
            name: name.into(),
            version: None,
            modifiers: BTreeSet::new(),
        }
    }

    /// Pin a version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add a modifier.
    pub fn with_modifier(mut self, modifier: RequiresModifier) -> Self {
        self.modifiers.insert(modifier);
        self
    }

    /// Check whether the directive is `requires static`.
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&RequiresModifier::Static)
    }
}

impl fmt::Display for Requires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Structured form of a module declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    name: String,
    requires: Vec<Requires>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    main_class: Option<String>,
}

impl ModuleDescriptor {
    /// Create a descriptor without requires and main class.
    pub fn new(name: impl Into<String>) -> Self {
        ModuleDescriptor {
            name: name.into(),
            requires: Vec::new(),
            main_class: None,
        }
    }

    /// Add a `requires` directive.
    ///
    /// A directive naming an already required module replaces nothing; the
    /// first occurrence wins, keeping `requires` an ordered set by name.
    pub fn with_requires(mut self, requires: Requires) -> Self {
        if !self.requires.iter().any(|r| r.name == requires.name) {
            self.requires.push(requires);
        }
        self
    }

    /// Set the main class.
    pub fn with_main_class(mut self, main_class: impl Into<String>) -> Self {
        self.main_class = Some(main_class.into());
        self
    }

    /// Module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required modules in declaration order.
    pub fn requires(&self) -> &[Requires] {
        &self.requires
    }

    /// Main class, if any.
    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    /// Names of all required modules.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.requires.iter().map(|r| r.name.as_str())
    }
}

/// Infer the main class of a module from the location of its declaration.
///
/// A module `a.b.c` declared in `<dir>/module-info.java` has the main class
/// `a.b.c.Main` if and only if `<dir>/a/b/c/Main.java` is a regular file.
pub fn infer_main_class(declaration: &Path, module: &str) -> Option<String> {
    let dir = declaration.parent()?;
    let candidate = module
        .split('.')
        .fold(dir.to_path_buf(), |path, segment| path.join(segment))
        .join("Main.java");
    if candidate.is_file() {
        Some(format!("{}.Main", module))
    } else {
        None
    }
}

//! Library directory of already resolved external modules.
//!
//! The library is a flat directory of `<module>.jar` or
//! `<module>@<version>.jar` files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// A module archive found in the library directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryModule {
    pub name: String,
    pub version: Option<String>,
    pub path: PathBuf,
}

/// View of a library directory.
#[derive(Debug, Clone)]
pub struct Library {
    dir: PathBuf,
}

impl Library {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Library { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check if the directory exists.
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// List all module archives, sorted by file name.
    ///
    /// A missing directory is an empty library.
    pub fn modules(&self) -> Result<Vec<LibraryModule>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let mut modules = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to list {}", self.dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some((name, version)) = entry.file_name().to_str().and_then(parse_jar_name) else {
                continue;
            };
            modules.push(LibraryModule {
                name,
                version,
                path: entry.into_path(),
            });
        }
        Ok(modules)
    }

    /// Names of all modules present.
    pub fn module_names(&self) -> Result<BTreeSet<String>> {
        Ok(self.modules()?.into_iter().map(|m| m.name).collect())
    }

    /// Path a module archive should be stored at.
    pub fn jar_path(&self, module: &str, version: Option<&str>) -> PathBuf {
        match version {
            Some(version) => self.dir.join(format!("{}@{}.jar", module, version)),
            None => self.dir.join(format!("{}.jar", module)),
        }
    }
}

/// Split `<module>[@<version>].jar` into name and version.
pub fn parse_jar_name(file_name: &str) -> Option<(String, Option<String>)> {
    let stem = file_name.strip_suffix(".jar")?;
    let (name, version) = match stem.split_once('@') {
        Some((name, version)) if !version.is_empty() => (name, Some(version.to_string())),
        Some((name, _)) => (name, None),
        None => (stem, None),
    };
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_jar_name() {
        assert_eq!(
            parse_jar_name("org.astro@1.2.jar"),
            Some(("org.astro".to_string(), Some("1.2".to_string())))
        );
        assert_eq!(parse_jar_name("junit.jar"), Some(("junit".to_string(), None)));
        assert_eq!(parse_jar_name("notes.txt"), None);
        assert_eq!(parse_jar_name(".jar"), None);
    }

    #[test]
    fn test_missing_library_is_empty() {
        let tmp = TempDir::new().unwrap();
        let library = Library::new(tmp.path().join("lib"));
        assert!(library.modules().unwrap().is_empty());
        assert!(library.module_names().unwrap().is_empty());
    }

    #[test]
    fn test_library_modules() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("org.astro@1.2.jar"), "").unwrap();
        fs::write(tmp.path().join("junit.jar"), "").unwrap();
        fs::write(tmp.path().join("README"), "").unwrap();

        let library = Library::new(tmp.path());
        let names: Vec<_> = library.module_names().unwrap().into_iter().collect();
        assert_eq!(names, vec!["junit", "org.astro"]);
        assert_eq!(
            library.jar_path("a", Some("1")),
            tmp.path().join("a@1.jar")
        );
    }

    #[test]
    fn test_library_dir_with_pattern_characters() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("proj[1]").join("lib");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("org.astro.jar"), "").unwrap();
        fs::write(dir.join("nested/ignored.jar"), "").unwrap();

        let modules = Library::new(&dir).modules().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "org.astro");
        assert_eq!(modules[0].path, dir.join("org.astro.jar"));
    }
}

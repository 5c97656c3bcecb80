//! Test fixtures for common test scenarios.
//!
//! A [`ProjectFixture`] is a project directory inside a temporary directory
//! that is removed when the fixture is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A project directory tree on disk.
#[derive(Debug)]
pub struct ProjectFixture {
    _tmp: TempDir,
    root: PathBuf,
}

impl ProjectFixture {
    /// Create an empty project directory named `name`.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub fn new(name: &str) -> Self {
        let tmp = TempDir::new().expect("create temporary directory");
        let root = tmp.path().join(name);
        fs::create_dir_all(&root).expect("create project directory");
        ProjectFixture { _tmp: tmp, root }
    }

    /// Add a file, creating parent directories.
    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        let path = self.root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, content).expect("write fixture file");
        self
    }

    /// Add a module declaration at `<dir>/module-info.java`.
    pub fn with_module(self, dir: impl AsRef<Path>, declaration: &str) -> Self {
        self.with_file(dir.as_ref().join("module-info.java"), declaration)
    }

    /// Project root directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// The "Project Jigsaw: Module System Quick-Start Guide" layout with a
    /// test space.
    ///
    /// ```text
    /// src/com.greetings/main/java   requires org.astro, has Main
    /// src/org.astro/main/java
    /// src/test.modules/test/java    requires org.astro
    /// ```
    pub fn jigsaw_quick_start() -> Self {
        ProjectFixture::new("jigsaw-quick-start")
            .with_module(
                "src/com.greetings/main/java",
                "module com.greetings {\n  requires org.astro;\n}\n",
            )
            .with_file(
                "src/com.greetings/main/java/com/greetings/Main.java",
                "package com.greetings;\npublic class Main {}\n",
            )
            .with_module(
                "src/org.astro/main/java",
                "module org.astro {\n  exports org.astro;\n}\n",
            )
            .with_file(
                "src/org.astro/main/java/org/astro/World.java",
                "package org.astro;\npublic class World {}\n",
            )
            .with_module(
                "src/test.modules/test/java",
                "open module test.modules {\n  requires org.astro;\n}\n",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_files() {
        let fixture = ProjectFixture::new("demo").with_module("a", "module a {}");
        assert!(fixture.path().ends_with("demo"));
        assert!(fixture.path().join("a/module-info.java").is_file());
    }

    #[test]
    fn test_fixture_is_removed_on_drop() {
        let fixture = ProjectFixture::jigsaw_quick_start();
        let root = fixture.path().to_path_buf();
        assert!(root.join("src/org.astro/main/java/module-info.java").is_file());
        drop(fixture);
        assert!(!root.exists());
    }
}

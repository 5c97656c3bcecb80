//! Global context for dockyard operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

use crate::core::manifest::MANIFEST_NAME;
use crate::util::config::{load_config, project_config_path, Config};

/// Project directories for dockyard
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("dev", "dockyard", "dockyard"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global dockyard data
    home: PathBuf,

    /// User-scoped cache directory
    cache: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let (home, cache) = match PROJECT_DIRS.as_ref() {
            Some(dirs) => (dirs.config_dir().to_path_buf(), dirs.cache_dir().to_path_buf()),
            None => {
                // Fallback to ~/.dockyard
                let home = BaseDirs::new()
                    .map(|b| b.home_dir().join(".dockyard"))
                    .unwrap_or_else(|| PathBuf::from(".dockyard"));
                let cache = home.join("cache");
                (home, cache)
            }
        };

        Ok(GlobalContext {
            cwd,
            home,
            cache,
            verbose: false,
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Use a different home and cache directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self.cache = self.home.join("cache");
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the dockyard home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the user-scoped cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache
    }

    /// Get the cache directory of the module registry property files.
    pub fn registry_cache_dir(&self) -> PathBuf {
        self.cache.join("modules")
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Find the project root: the closest ancestor of cwd holding a
    /// `dockyard.toml`, or cwd itself.
    pub fn project_root(&self) -> PathBuf {
        let mut current = self.cwd.clone();
        loop {
            if current.join(MANIFEST_NAME).is_file() {
                return current;
            }
            if !current.pop() {
                return self.cwd.clone();
            }
        }
    }

    /// Load the merged global and project configuration.
    pub fn config(&self, project_root: &Path) -> Config {
        let global = self.config_path();
        load_config(Some(&global), &project_config_path(project_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
        assert!(ctx.registry_cache_dir().ends_with("modules"));
    }

    #[test]
    fn test_project_root_searches_upward() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), "").unwrap();
        let nested = tmp.path().join("src/a");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested).unwrap();
        assert_eq!(ctx.project_root(), tmp.path());
    }

    #[test]
    fn test_project_root_defaults_to_cwd() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).unwrap();
        assert_eq!(ctx.project_root(), tmp.path());
    }

    #[test]
    fn test_project_config_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::write(home.join("config.toml"), "[build]\nrelease = 17\njobs = 3\n").unwrap();
        let project = tmp.path().join("project");
        std::fs::create_dir_all(project.join(".dockyard")).unwrap();
        std::fs::write(project.join(".dockyard/config.toml"), "[build]\nrelease = 22\n").unwrap();

        let ctx = GlobalContext::with_cwd(project.clone()).unwrap().with_home(&home);
        let config = ctx.config(&project);
        assert_eq!(config.release(), 22);
        assert_eq!(config.build.jobs, Some(3));
    }
}

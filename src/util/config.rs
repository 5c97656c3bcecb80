//! Configuration file support for dockyard.
//!
//! dockyard reads configuration from two locations:
//! - Global: `<user data dir>/config.toml` - User-wide defaults
//! - Project: `.dockyard/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::paths::DOCKYARD_DIR;

/// Maven Central repository base URL.
pub const MAVEN_CENTRAL: &str = "https://repo.maven.apache.org/maven2";

/// Default remote location of the module registry property files.
pub const DEFAULT_REGISTRY_URL: &str = "https://github.com/sormuras/modules/raw/master";

/// Feature release assumed when compiling with preview features.
pub const DEFAULT_RELEASE: u32 = 21;

/// dockyard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default number of parallel jobs (None = auto-detect)
    pub jobs: Option<usize>,

    /// Stop at the first failing task (default: true)
    pub fail_fast: Option<bool>,

    /// Release passed along `--enable-preview`
    pub release: Option<u32>,

    /// Extra arguments appended to every compile task
    #[serde(default)]
    pub javac_args: Vec<String>,

    /// Extra arguments appended to every package task
    #[serde(default)]
    pub jar_args: Vec<String>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Offline mode (don't fetch from network)
    #[serde(default)]
    pub offline: bool,

    /// Request timeout in seconds
    pub timeout: Option<u64>,

    /// Base URL of the Maven repository
    pub maven_repository: Option<String>,

    /// Base URL of the module registry property files
    pub registry_url: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Build settings
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.fail_fast.is_some() {
            self.build.fail_fast = other.build.fail_fast;
        }
        if other.build.release.is_some() {
            self.build.release = other.build.release;
        }
        if !other.build.javac_args.is_empty() {
            self.build.javac_args = other.build.javac_args;
        }
        if !other.build.jar_args.is_empty() {
            self.build.jar_args = other.build.jar_args;
        }

        // Net settings
        if other.net.offline {
            self.net.offline = true;
        }
        if other.net.timeout.is_some() {
            self.net.timeout = other.net.timeout;
        }
        if other.net.maven_repository.is_some() {
            self.net.maven_repository = other.net.maven_repository;
        }
        if other.net.registry_url.is_some() {
            self.net.registry_url = other.net.registry_url;
        }
    }

    pub fn fail_fast(&self) -> bool {
        self.build.fail_fast.unwrap_or(true)
    }

    pub fn release(&self) -> u32 {
        self.build.release.unwrap_or(DEFAULT_RELEASE)
    }

    pub fn maven_repository(&self) -> &str {
        self.net.maven_repository.as_deref().unwrap_or(MAVEN_CENTRAL)
    }

    pub fn registry_url(&self) -> &str {
        self.net.registry_url.as_deref().unwrap_or(DEFAULT_REGISTRY_URL)
    }

    /// Request timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.net.timeout.map(Duration::from_secs)
    }
}

/// Get the project config path (.dockyard/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(DOCKYARD_DIR).join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.dockyard/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.fail_fast());
        assert_eq!(config.release(), DEFAULT_RELEASE);
        assert_eq!(config.maven_repository(), MAVEN_CENTRAL);
        assert!(!config.net.offline);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
jobs = 8
fail_fast = false
javac_args = ["-Xlint"]

[net]
offline = true
maven_repository = "https://maven.example.org"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.jobs, Some(8));
        assert!(!config.fail_fast());
        assert_eq!(config.build.javac_args, vec!["-Xlint"]);
        assert!(config.net.offline);
        assert_eq!(config.maven_repository(), "https://maven.example.org");
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.build.jobs = Some(4);
        base.build.release = Some(17);

        let mut override_cfg = Config::default();
        override_cfg.build.release = Some(22);

        base.merge(override_cfg);

        assert_eq!(base.release(), 22);
        assert_eq!(base.build.jobs, Some(4)); // Not overridden
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(&global_path, "[build]\njobs = 2\nrelease = 17\n").unwrap();
        std::fs::write(&project_path, "[build]\nrelease = 21\n").unwrap();

        let config = load_config(Some(&global_path), &project_path);
        assert_eq!(config.build.jobs, Some(2));
        assert_eq!(config.release(), 21);
    }

    #[test]
    fn test_broken_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[build\njobs = ").unwrap();
        assert_eq!(Config::load_or_default(&path), Config::default());
    }
}

//! Project directory layout.
//!
//! All build outputs live under `<root>/.dockyard/out/<space>/`:
//!
//! ```text
//! .dockyard/out/main/
//! ├── classes/<module>/...           # compiled classes, one folder per module
//! ├── modules/<module>@<version>.jar # modular archives
//! ├── api/                           # generated documentation
//! └── image/                         # custom runtime image
//! ```

use std::path::{Path, PathBuf};

/// Name of the project-local dockyard directory.
pub const DOCKYARD_DIR: &str = ".dockyard";

/// Default library directory, relative to the project root.
pub const DEFAULT_LIB_DIR: &str = "lib";

/// Resolved paths of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
    out: PathBuf,
    lib: PathBuf,
}

impl ProjectPaths {
    /// Create the default layout for a project root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let out = root.join(DOCKYARD_DIR).join("out");
        let lib = root.join(DEFAULT_LIB_DIR);
        ProjectPaths { root, out, lib }
    }

    /// Use a different library directory; relative paths resolve against the root.
    pub fn with_lib(mut self, lib: impl AsRef<Path>) -> Self {
        self.lib = self.root.join(lib);
        self
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root of all build outputs.
    pub fn out(&self) -> &Path {
        &self.out
    }

    /// Library directory holding external modules.
    pub fn lib(&self) -> &Path {
        &self.lib
    }

    /// Output directory of a space.
    pub fn space(&self, space: &str) -> PathBuf {
        self.out.join(space)
    }

    /// Compiled classes of a space.
    pub fn classes(&self, space: &str) -> PathBuf {
        self.space(space).join("classes")
    }

    /// Compiled classes of one module in a space.
    pub fn module_classes(&self, space: &str, module: &str) -> PathBuf {
        self.classes(space).join(module)
    }

    /// Modular archives of a space.
    pub fn modules(&self, space: &str) -> PathBuf {
        self.space(space).join("modules")
    }

    /// Archive of one module in a space.
    pub fn module_jar(&self, space: &str, module: &str, version: &str) -> PathBuf {
        self.modules(space)
            .join(format!("{}@{}.jar", module, version))
    }

    /// Generated documentation of a space.
    pub fn api(&self, space: &str) -> PathBuf {
        self.space(space).join("api")
    }

    /// Test reports of a space, one directory per module.
    pub fn reports(&self, space: &str) -> PathBuf {
        self.space(space).join("reports")
    }

    /// Runtime image of a space.
    pub fn image(&self, space: &str) -> PathBuf {
        self.space(space).join("image")
    }
}

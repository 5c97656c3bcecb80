//! Assignment of declaration files to spaces.
//!
//! Three policies are supported:
//! - layered: a file belongs to the space whose name occurs exactly once
//!   among the segments of its path (`src/foo/test/java/...` is in `test`)
//! - flat: every file belongs to a single `main` space
//! - explicit: `[[space]]` manifest entries select files by glob
//!
//! Layered assignment is attempted first; if no file matches any conventional
//! space name the flat policy applies. Explicit assignment replaces both as
//! soon as one manifest entry lists `paths`.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::manifest::{ProjectManifest, SpaceSection};
use crate::core::space::{SpaceError, SpaceFlags, MAIN, TEST, TEST_PREVIEW};

/// Conventional spaces, in matching priority order.
pub const PRIORITY: [&str; 3] = [TEST_PREVIEW, TEST, MAIN];

/// Errors raised while laying out spaces.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum LayoutError {
    #[error("{} declaration file(s) belong to no space: {}", .files.len(), display_files(.files))]
    #[diagnostic(
        code(dockyard::scan::unassigned),
        help("place declarations below a `main`, `test` or `test-preview` folder, or assign them in dockyard.toml")
    )]
    Unassigned { files: Vec<PathBuf> },

    #[error("declaration file {} is selected by several spaces: {}", .file.display(), .spaces.join(", "))]
    #[diagnostic(code(dockyard::scan::ambiguous))]
    Ambiguous { file: PathBuf, spaces: Vec<String> },

    #[error("invalid path pattern `{pattern}` for space `{space}`")]
    #[diagnostic(code(dockyard::scan::pattern))]
    InvalidPattern {
        space: String,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no module declarations found in {}", .root.display())]
    #[diagnostic(
        code(dockyard::scan::empty),
        help("a module is declared by a `module-info.java` file")
    )]
    NoModules { root: PathBuf },

    #[error("declared modules require each other: {}", .modules.join(" -> "))]
    #[diagnostic(code(dockyard::scan::cycle))]
    Cycle { modules: Vec<String> },

    #[error("no module source path can be derived for module `{module}`")]
    #[diagnostic(
        code(dockyard::scan::source_path),
        help("the unit of `{module}` has no source folder containing its declaration")
    )]
    NotDerivable { module: String },

    #[error(transparent)]
    #[diagnostic(code(dockyard::scan::space))]
    Space(#[from] SpaceError),
}

fn display_files(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| f.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Declaration files assigned to one space, along with its policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub space: String,
    pub upstreams: Vec<String>,
    pub flags: SpaceFlags,
    pub release: Option<u32>,
    pub files: Vec<PathBuf>,
}

impl Assignment {
    fn new(space: &str, upstreams: &[&str], flags: SpaceFlags) -> Self {
        Assignment {
            space: space.to_string(),
            upstreams: upstreams.iter().map(|s| s.to_string()).collect(),
            flags,
            release: None,
            files: Vec::new(),
        }
    }

    fn conventional(space: &str) -> Self {
        match space {
            TEST => Assignment::new(TEST, &[MAIN], SpaceFlags::default()),
            TEST_PREVIEW => Assignment::new(
                TEST_PREVIEW,
                &[MAIN, TEST],
                SpaceFlags {
                    preview: true,
                    ..SpaceFlags::default()
                },
            ),
            other => Assignment::new(other, &[], SpaceFlags::default()),
        }
    }

    fn override_with(mut self, section: &SpaceSection) -> Self {
        self.flags = section.apply(self.flags);
        if let Some(upstreams) = &section.upstreams {
            self.upstreams = upstreams.clone();
        }
        if section.release.is_some() {
            self.release = section.release;
        }
        self
    }
}

/// Assign files to spaces following the manifest.
///
/// `files` are declaration paths below `root`. Empty assignments are dropped
/// and upstream names of dropped spaces are removed.
pub fn assign(
    root: &Path,
    files: &[PathBuf],
    manifest: &ProjectManifest,
) -> Result<Vec<Assignment>, LayoutError> {
    let assignments = if manifest.is_explicit() {
        explicit(root, files, &manifest.spaces)?
    } else {
        let conventional = match layered(root, files)? {
            Some(assignments) => assignments,
            None => flat(files),
        };
        conventional
            .into_iter()
            .map(|a| match manifest.space(&a.space) {
                Some(section) => a.override_with(section),
                None => a,
            })
            .collect()
    };

    let kept: Vec<Assignment> = assignments
        .into_iter()
        .filter(|a| !a.files.is_empty())
        .collect();
    let names: Vec<String> = kept.iter().map(|a| a.space.clone()).collect();
    Ok(kept
        .into_iter()
        .map(|mut a| {
            a.upstreams.retain(|u| names.contains(u));
            a
        })
        .collect())
}

/// Segment-frequency assignment.
///
/// Returns `None` if no file matches any conventional space.
pub fn layered(root: &Path, files: &[PathBuf]) -> Result<Option<Vec<Assignment>>, LayoutError> {
    let mut assignments: Vec<Assignment> = [MAIN, TEST, TEST_PREVIEW]
        .into_iter()
        .map(Assignment::conventional)
        .collect();
    let mut unassigned = Vec::new();

    for file in files {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let segments: Vec<&str> = relative
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        let space = PRIORITY
            .iter()
            .find(|name| segments.iter().filter(|s| *s == *name).count() == 1);
        match space {
            Some(name) => {
                if let Some(assignment) = assignments.iter_mut().find(|a| a.space == *name) {
                    assignment.files.push(file.clone());
                }
            }
            None => unassigned.push(file.clone()),
        }
    }

    if unassigned.len() == files.len() {
        return Ok(None);
    }
    if !unassigned.is_empty() {
        return Err(LayoutError::Unassigned { files: unassigned });
    }
    Ok(Some(assignments))
}

/// Single-space assignment.
pub fn flat(files: &[PathBuf]) -> Vec<Assignment> {
    let mut main = Assignment::conventional(MAIN);
    main.files = files.to_vec();
    vec![main]
}

/// Glob-based assignment from `[[space]]` entries.
pub fn explicit(
    root: &Path,
    files: &[PathBuf],
    sections: &[SpaceSection],
) -> Result<Vec<Assignment>, LayoutError> {
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };

    let mut compiled = Vec::with_capacity(sections.len());
    for section in sections {
        let patterns = section
            .paths
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| LayoutError::InvalidPattern {
                    space: section.name.clone(),
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        compiled.push(patterns);
    }

    let mut assignments: Vec<Assignment> = sections
        .iter()
        .map(|section| Assignment::new(&section.name, &[], SpaceFlags::default()).override_with(section))
        .collect();
    let mut unassigned = Vec::new();

    for file in files {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let matching: Vec<usize> = compiled
            .iter()
            .enumerate()
            .filter(|(_, patterns)| patterns.iter().any(|p| p.matches_path_with(relative, options)))
            .map(|(index, _)| index)
            .collect();
        match matching.as_slice() {
            [] => unassigned.push(file.clone()),
            [index] => assignments[*index].files.push(file.clone()),
            several => {
                return Err(LayoutError::Ambiguous {
                    file: file.clone(),
                    spaces: several.iter().map(|i| sections[*i].name.clone()).collect(),
                })
            }
        }
    }

    if !unassigned.is_empty() {
        return Err(LayoutError::Unassigned { files: unassigned });
    }
    Ok(assignments)
}

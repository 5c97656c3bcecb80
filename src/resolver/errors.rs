//! Resolution error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A module nobody could provide, with the modules requiring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub module: String,
    pub required_by: Vec<String>,
}

/// Error during external module resolution.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ResolutionError {
    #[error("{} module(s) could not be resolved: {}", .modules.len(), names(.modules))]
    #[diagnostic(
        code(dockyard::resolve::unresolved),
        help("add a link for each module to the `[library.links]` table of dockyard.toml")
    )]
    Unresolved { modules: Vec<Unresolved> },

    #[error("version conflict for `{module}`")]
    #[diagnostic(code(dockyard::resolve::version_conflict))]
    VersionConflict {
        module: String,
        requirements: Vec<(String, String)>, // (requirer, version)
    },

    #[error("{} module(s) could not be downloaded: {}", .failures.len(), failed(.failures))]
    #[diagnostic(code(dockyard::resolve::download))]
    Download {
        failures: Vec<(String, String)>, // (module, message)
    },

    #[error("failed to read library directory: {message}")]
    #[diagnostic(code(dockyard::resolve::library))]
    Library { message: String },
}

fn names(modules: &[Unresolved]) -> String {
    modules
        .iter()
        .map(|m| m.module.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn failed(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(module, _)| module.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ResolutionError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolutionError::Unresolved { modules } => {
                let mut diag = Diagnostic::error(format!(
                    "{} module(s) could not be resolved",
                    modules.len()
                ));
                for unresolved in modules {
                    diag = if unresolved.required_by.is_empty() {
                        diag.with_context(unresolved.module.clone())
                    } else {
                        diag.with_context(format!(
                            "{} (required by {})",
                            unresolved.module,
                            unresolved.required_by.join(", ")
                        ))
                    };
                }
                diag.with_suggestion(suggestions::UNRESOLVED)
                    .with_suggestion("Place the module archives in the library directory")
            }

            ResolutionError::VersionConflict {
                module,
                requirements,
            } => {
                let mut diag = Diagnostic::error(format!("version conflict for `{}`", module));
                for (requirer, version) in requirements {
                    diag = diag.with_context(format!("`{}` requires {}@{}", requirer, module, version));
                }
                diag.with_suggestion(format!("Pin the same version of `{}` everywhere", module))
            }

            ResolutionError::Download { failures } => {
                let mut diag = Diagnostic::error(format!(
                    "{} module(s) could not be downloaded",
                    failures.len()
                ));
                for (module, message) in failures {
                    diag = diag.with_context(format!("{}: {}", module, message));
                }
                diag.with_suggestion("Check your network connection")
                    .with_suggestion(suggestions::OFFLINE)
            }

            ResolutionError::Library { message } => {
                Diagnostic::error(format!("failed to read library directory: {}", message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_lists_every_module() {
        let err = ResolutionError::Unresolved {
            modules: vec![
                Unresolved {
                    module: "org.astro".into(),
                    required_by: vec!["com.greetings".into()],
                },
                Unresolved {
                    module: "org.junit.jupiter".into(),
                    required_by: vec![],
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 module(s) could not be resolved: org.astro, org.junit.jupiter"
        );

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("org.astro (required by com.greetings)"));
        assert!(output.contains("org.junit.jupiter\n"));
    }

    #[test]
    fn test_version_conflict_diagnostic() {
        let err = ResolutionError::VersionConflict {
            module: "org.astro".into(),
            requirements: vec![("a".into(), "1".into()), ("b".into(), "2".into())],
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("`a` requires org.astro@1"));
        assert!(output.contains("`b` requires org.astro@2"));
    }
}

//! Module declaration parsing.
//!
//! Only the subset of the module declaration grammar needed for building is
//! understood: the `module <name> {` header and `requires` directives with
//! an optional inline version comment:
//!
//! ```java
//! module com.greetings {
//!   requires transitive org.astro /* 1.2 */;
//!   requires static java.compiler;
//! }
//! ```

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use miette::Diagnostic as MietteDiagnostic;
use regex::Regex;
use thiserror::Error;

use crate::core::descriptor::{infer_main_class, ModuleDescriptor, Requires, RequiresModifier};

/// `module Identifier{.Identifier} {`, matched against comment-masked text.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w.$])(?:open\s+)?module\s+([A-Za-z_$][\w$.]*)\s*\{")
        .expect("valid header pattern")
});

/// `requires {RequiresModifier} ModuleName [/* version */] ;`
static REQUIRES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^\w.$])requires\s+((?:(?:static|transitive)\s+)*)([A-Za-z_$][\w$.]*)\s*(?:/\*\s*([\w.\-+]+)\s*\*/\s*)?;",
    )
    .expect("valid requires pattern")
});

/// Error raised when a declaration cannot be parsed.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ParseError {
    #[error("no module declaration header found{}", display_path(.path))]
    #[diagnostic(
        code(dockyard::scan::no_module_header),
        help("a module declaration starts with `module <name> {{`")
    )]
    MissingHeader { path: Option<PathBuf> },

    #[error("failed to read module declaration {}", .path.display())]
    #[diagnostic(code(dockyard::scan::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

impl ParseError {
    /// Attach the file the failing text was read from.
    pub fn in_file(self, file: &Path) -> Self {
        match self {
            ParseError::MissingHeader { .. } => ParseError::MissingHeader {
                path: Some(file.to_path_buf()),
            },
            other => other,
        }
    }
}

/// Parses declaration source text into a descriptor.
pub trait DeclarationParser: Send + Sync {
    /// Parse the text of a module declaration.
    fn parse(&self, source: &str) -> Result<ModuleDescriptor, ParseError>;

    /// Read and parse a declaration file, inferring the main class.
    fn describe(&self, info: &Path) -> Result<ModuleDescriptor, ParseError> {
        let source = std::fs::read_to_string(info).map_err(|source| ParseError::Io {
            path: info.to_path_buf(),
            source,
        })?;
        let descriptor = self.parse(&source).map_err(|e| e.in_file(info))?;
        Ok(match infer_main_class(info, descriptor.name()) {
            Some(main) => descriptor.with_main_class(main),
            None => descriptor,
        })
    }
}

/// Pattern-based parser for module declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexDeclarationParser;

impl DeclarationParser for RegexDeclarationParser {
    fn parse(&self, source: &str) -> Result<ModuleDescriptor, ParseError> {
        let comments = Comments::scan(source);
        let masked = comments.masked(source);

        let header = HEADER
            .captures(&masked)
            .ok_or(ParseError::MissingHeader { path: None })?;
        let (Some(whole), Some(name)) = (header.get(0), header.get(1)) else {
            return Err(ParseError::MissingHeader { path: None });
        };
        let mut descriptor = ModuleDescriptor::new(name.as_str());

        // Version comments live inside block comments, so directives are
        // matched against the unmasked body and filtered by position.
        let body_start = whole.end();
        let body = comments.without_line_comments(source);
        for captures in REQUIRES.captures_iter(&body[body_start..]) {
            let Some(directive) = captures.get(2) else {
                continue;
            };
            if comments.is_commented(body_start + directive.start()) {
                continue;
            }
            let mut requires = Requires::new(directive.as_str());
            if let Some(modifiers) = captures.get(1) {
                for keyword in modifiers.as_str().split_whitespace() {
                    if let Some(modifier) = RequiresModifier::from_keyword(keyword) {
                        requires = requires.with_modifier(modifier);
                    }
                }
            }
            if let Some(version) = captures.get(3) {
                requires = requires.with_version(version.as_str());
            }
            descriptor = descriptor.with_requires(requires);
        }

        Ok(descriptor)
    }
}

/// Byte ranges of the comments in a source text.
#[derive(Debug, Default)]
struct Comments {
    line: Vec<Range<usize>>,
    block: Vec<Range<usize>>,
}

impl Comments {
    fn scan(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut comments = Comments::default();
        let mut i = 0;
        while i + 1 < bytes.len() {
            match (bytes[i], bytes[i + 1]) {
                (b'/', b'/') => {
                    let end = source[i..].find('\n').map_or(bytes.len(), |n| i + n);
                    comments.line.push(i..end);
                    i = end;
                }
                (b'/', b'*') => {
                    let end = source[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
                    comments.block.push(i..end);
                    i = end;
                }
                _ => i += 1,
            }
        }
        comments
    }

    fn is_commented(&self, offset: usize) -> bool {
        self.line
            .iter()
            .chain(&self.block)
            .any(|range| range.contains(&offset))
    }

    fn blank(source: &str, ranges: &[&Range<usize>]) -> String {
        let mut bytes = source.as_bytes().to_vec();
        for range in ranges {
            for byte in &mut bytes[(*range).clone()] {
                if *byte != b'\n' {
                    *byte = b' ';
                }
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Source with line comments blanked out, offsets preserved.
    fn without_line_comments(&self, source: &str) -> String {
        Self::blank(source, &self.line.iter().collect::<Vec<_>>())
    }

    /// Source with every comment blanked out, offsets preserved.
    fn masked(&self, source: &str) -> String {
        Self::blank(source, &self.line.iter().chain(&self.block).collect::<Vec<_>>())
    }
}

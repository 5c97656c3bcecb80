//! Asset mini-language.
//!
//! Each non-empty line that does not start with `#` has the form
//! `TARGET=SCHEME:SOURCE`:
//!
//! ```text
//! # Write a literal file
//! .dockyard/greeting.txt=string:Hello
//! # Download a file, verifying it
//! lib/junit.jar=https://repo.maven.apache.org/maven2/junit/junit/4.13.2/junit-4.13.2.jar#size=384581
//! ```
//!
//! An existing target that passes its checks (or holds the same string) is
//! left untouched.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::sources::download::{download, DownloadOutcome};
use crate::sources::http::HttpClient;
use crate::util::fs::write_string;

/// Source of a grab entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabSource {
    /// Literal file content
    String(String),
    /// Remote address, optionally carrying an integrity fragment
    Https(String),
}

/// One `TARGET=SCHEME:SOURCE` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabEntry {
    pub target: PathBuf,
    pub source: GrabSource,
}

/// Result of processing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

impl GrabEntry {
    /// Parse a single line.
    pub fn parse(line: &str) -> Result<Self> {
        let Some((target, source)) = line.split_once('=') else {
            bail!("expected `TARGET=SCHEME:SOURCE`, found `{}`", line);
        };
        let target = target.trim();
        if target.is_empty() {
            bail!("missing target in `{}`", line);
        }
        let Some((scheme, rest)) = source.split_once(':') else {
            bail!("missing scheme in `{}`", line);
        };
        let source = match scheme {
            "string" => GrabSource::String(rest.to_string()),
            "https" => GrabSource::Https(source.trim().to_string()),
            other => bail!("unsupported scheme `{}` in `{}`", other, line),
        };
        Ok(GrabEntry {
            target: PathBuf::from(target),
            source,
        })
    }
}

/// Parse every entry of a grab file text.
pub fn parse(text: &str) -> Result<Vec<GrabEntry>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            GrabEntry::parse(line.trim_start()).with_context(|| format!("line {}", index + 1))
        })
        .collect()
}

/// Process entries, resolving relative targets against `base`.
pub fn grab(client: &dyn HttpClient, base: &Path, entries: &[GrabEntry]) -> Result<Vec<GrabOutcome>> {
    let mut outcomes = Vec::with_capacity(entries.len());
    for entry in entries {
        let target = base.join(&entry.target);
        let outcome = match &entry.source {
            GrabSource::String(content) => {
                let unchanged = std::fs::read_to_string(&target)
                    .map(|existing| existing == *content)
                    .unwrap_or(false);
                if unchanged {
                    GrabOutcome::Skipped(target)
                } else {
                    write_string(&target, content)?;
                    GrabOutcome::Written(target)
                }
            }
            GrabSource::Https(address) => match download(client, address, &target)? {
                DownloadOutcome::Present => GrabOutcome::Skipped(target),
                DownloadOutcome::Fetched(_) => GrabOutcome::Written(target),
            },
        };
        tracing::debug!("{:?}", outcome);
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttpClient;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_entries() {
        let entries = parse(
            "# comment\n\
             a.txt=string:Hello = World\n\
             \n\
             lib/b.jar=https://example.org/b.jar#size=3\n",
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            GrabEntry {
                target: PathBuf::from("a.txt"),
                source: GrabSource::String("Hello = World".to_string()),
            }
        );
        assert_eq!(
            entries[1].source,
            GrabSource::Https("https://example.org/b.jar#size=3".to_string())
        );
    }

    #[test]
    fn test_parse_unsupported_scheme() {
        let err = parse("a=ftp://example.org/a").unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
        assert!(format!("{:#}", err).contains("unsupported scheme `ftp`"));
    }

    #[test]
    fn test_grab_writes_and_skips() {
        let tmp = TempDir::new().unwrap();
        let client = MockHttpClient::new().with_body("https://example.org/b.jar", "abc");
        let entries = parse("a.txt=string:Hello\nlib/b.jar=https://example.org/b.jar#size=3").unwrap();

        let first = grab(&client, tmp.path(), &entries).unwrap();
        assert!(first.iter().all(|o| matches!(o, GrabOutcome::Written(_))));
        assert_eq!(fs::read_to_string(tmp.path().join("a.txt")).unwrap(), "Hello");

        let second = grab(&client, tmp.path(), &entries).unwrap();
        assert!(second.iter().all(|o| matches!(o, GrabOutcome::Skipped(_))));
        assert_eq!(client.requests().len(), 1);
    }
}

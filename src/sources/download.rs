//! Integrity-checked downloads into the filesystem.
//!
//! A location may carry a fragment of `algorithm=hexdigest` pairs and the
//! pseudo-algorithm `size=n`:
//!
//! ```text
//! https://example.org/a.jar#sha256=2cf2...&size=5
//! ```
//!
//! Targets are written through a temporary file in the target directory and
//! renamed into place, so a concurrent reader never sees a partial file.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;
use url::Url;

use crate::sources::http::HttpClient;
use crate::util::fs::ensure_parent;
use crate::util::hash::verify_file;

/// What happened to a download target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The target was present and passed its checks.
    Present,
    /// The target was fetched; holds the number of bytes written.
    Fetched(u64),
}

/// A location split into its address and integrity checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub address: String,
    pub checks: Vec<(String, String)>,
}

impl Location {
    /// Parse a location, removing an integrity fragment if present.
    pub fn parse(location: &str) -> Result<Self> {
        let mut url = Url::parse(location)
            .with_context(|| format!("invalid location `{}`", location))?;
        let checks = url
            .fragment()
            .map(|fragment| {
                url::form_urlencoded::parse(fragment.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        url.set_fragment(None);
        Ok(Location {
            address: url.to_string(),
            checks,
        })
    }
}

/// Fetch `location` into `target` unless a verified copy already exists.
pub fn download(client: &dyn HttpClient, location: &str, target: &Path) -> Result<DownloadOutcome> {
    let location = Location::parse(location)?;

    if target.is_file() {
        match verify_file(target, &location.checks) {
            Ok(()) => {
                tracing::debug!("{} is present", target.display());
                return Ok(DownloadOutcome::Present);
            }
            Err(e) => tracing::warn!("refetching {}: {:#}", target.display(), e),
        }
    }

    ensure_parent(target)?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;

    let bytes = fetch(client, &location.address, temp.as_file_mut())?;
    verify_file(temp.path(), &location.checks)
        .with_context(|| format!("integrity check of {} failed", location.address))?;

    temp.persist(target)
        .with_context(|| format!("failed to move download to {}", target.display()))?;
    tracing::info!("Downloaded {} ({} bytes)", target.display(), bytes);
    Ok(DownloadOutcome::Fetched(bytes))
}

fn fetch(client: &dyn HttpClient, address: &str, file: &mut File) -> Result<u64> {
    let url = Url::parse(address).with_context(|| format!("invalid location `{}`", address))?;
    match url.scheme() {
        "file" => {
            let Ok(path) = url.to_file_path() else {
                bail!("invalid file location `{}`", address);
            };
            let mut source = File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            io::copy(&mut source, file).with_context(|| format!("failed to copy {}", path.display()))
        }
        "http" | "https" => client.download(address, file),
        other => bail!("unsupported location scheme `{}` in `{}`", other, address),
    }
}

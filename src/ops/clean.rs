//! Implementation of `dockyard clean`.

use anyhow::Result;

use crate::core::paths::ProjectPaths;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove all build outputs. Returns whether anything was removed.
pub fn clean(paths: &ProjectPaths) -> Result<bool> {
    let out = paths.out();
    if !out.exists() {
        return Ok(false);
    }
    tracing::debug!("removing {}", out.display());
    remove_dir_all_if_exists(out)?;
    Ok(true)
}

//! Implementation of `dockyard grab`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::sources::grab::{self, GrabOutcome};
use crate::sources::http::HttpClient;
use crate::util::fs::read_to_string;

/// Process a grab file; relative targets resolve against `base`.
pub fn grab_file(client: &dyn HttpClient, file: &Path, base: &Path) -> Result<Vec<GrabOutcome>> {
    let text = read_to_string(file)?;
    let entries =
        grab::parse(&text).with_context(|| format!("failed to parse {}", file.display()))?;
    tracing::debug!("{} grab entr(y|ies) in {}", entries.len(), file.display());
    grab::grab(client, base, &entries)
        .with_context(|| format!("failed to process {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttpClient;
    use tempfile::TempDir;

    #[test]
    fn test_grab_file_targets_resolve_against_base() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("assets.grab");
        std::fs::write(&file, "# assets\nout/hello.txt=string:Hello\n").unwrap();
        let base = tmp.path().join("project");

        let outcomes = grab_file(&MockHttpClient::new(), &file, &base).unwrap();
        assert_eq!(outcomes, vec![GrabOutcome::Written(base.join("out/hello.txt"))]);
        assert_eq!(std::fs::read_to_string(base.join("out/hello.txt")).unwrap(), "Hello");
    }

    #[test]
    fn test_grab_file_reports_line() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("bad.grab");
        std::fs::write(&file, "ok.txt=string:x\nbroken\n").unwrap();

        let err = grab_file(&MockHttpClient::new(), &file, tmp.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}

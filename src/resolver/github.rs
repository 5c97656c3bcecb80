//! Locator for modules released as GitHub release assets.
//!
//! A module named `com.github.<user>.<repo>[...]` is looked up as the asset
//! `<module>@<tag>.jar` of a release of `github.com/<user>/<repo>`. The tag
//! of the latest release is tried first, then a few conventional tags.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::resolver::locator::Locator;
use crate::sources::http::HttpClient;

/// Default GitHub base URL.
pub const GITHUB: &str = "https://github.com";

/// Tags probed when the latest release has no matching asset.
pub const FALLBACK_TAGS: [&str; 4] = ["early-access", "ea", "latest", "snapshot"];

static RELEASE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"/releases/tag/([^"'/?#<>\s]+)"#).expect("valid release tag pattern")
});

/// Locator scraping GitHub release pages.
pub struct GitHubLocator {
    base: String,
    client: Arc<dyn HttpClient>,
}

impl GitHubLocator {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        GitHubLocator {
            base: GITHUB.to_string(),
            client,
        }
    }

    /// Use a different base URL.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Split `com.github.<user>.<repo>...` into user and repository.
    pub fn repository_of(module: &str) -> Option<(&str, &str)> {
        let mut segments = module.strip_prefix("com.github.")?.split('.');
        let user = segments.next().filter(|s| !s.is_empty())?;
        let repo = segments.next().filter(|s| !s.is_empty())?;
        Some((user, repo))
    }

    /// Extract the latest release tag from a release listing page.
    pub fn latest_tag(page: &str) -> Option<&str> {
        RELEASE_TAG
            .captures(page)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    fn asset(&self, user: &str, repo: &str, module: &str, tag: &str) -> String {
        format!(
            "{}/{}/{}/releases/download/{}/{}@{}.jar",
            self.base, user, repo, tag, module, tag
        )
    }

    fn probe(&self, url: &str) -> bool {
        match self.client.exists(url) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!("probing {} failed: {:#}", url, e);
                false
            }
        }
    }
}

impl Locator for GitHubLocator {
    fn locate(&self, module: &str) -> Option<String> {
        let (user, repo) = Self::repository_of(module)?;

        let releases = format!("{}/{}/{}/releases/latest", self.base, user, repo);
        let latest = match self.client.get_text(&releases) {
            Ok(Some(page)) => Self::latest_tag(&page).map(str::to_string),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("failed to read releases of {}/{}: {:#}", user, repo, e);
                None
            }
        };

        let found = latest
            .iter()
            .map(String::as_str)
            .chain(FALLBACK_TAGS)
            .map(|tag| self.asset(user, repo, module, tag))
            .find(|url| self.probe(url));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttpClient;

    #[test]
    fn test_repository_of() {
        assert_eq!(
            GitHubLocator::repository_of("com.github.sormuras.bach"),
            Some(("sormuras", "bach"))
        );
        assert_eq!(
            GitHubLocator::repository_of("com.github.user.repo.extra"),
            Some(("user", "repo"))
        );
        assert_eq!(GitHubLocator::repository_of("com.github.user"), None);
        assert_eq!(GitHubLocator::repository_of("org.astro"), None);
    }

    #[test]
    fn test_latest_tag() {
        let page = r#"<a href="/sormuras/bach/releases/tag/17.0.1">17.0.1</a>"#;
        assert_eq!(GitHubLocator::latest_tag(page), Some("17.0.1"));
        assert_eq!(GitHubLocator::latest_tag("<html></html>"), None);
    }

    #[test]
    fn test_locate_latest_release() {
        let client = Arc::new(
            MockHttpClient::new()
                .with_body(
                    "https://github.com/user/repo/releases/latest",
                    r#"<a href="/user/repo/releases/tag/1.0">"#,
                )
                .with_body(
                    "https://github.com/user/repo/releases/download/1.0/com.github.user.repo@1.0.jar",
                    "jar",
                ),
        );
        let locator = GitHubLocator::new(client);
        assert_eq!(
            locator.locate("com.github.user.repo").as_deref(),
            Some("https://github.com/user/repo/releases/download/1.0/com.github.user.repo@1.0.jar")
        );
    }

    #[test]
    fn test_locate_fallback_tag() {
        let client = Arc::new(MockHttpClient::new().with_body(
            "https://github.com/user/repo/releases/download/ea/com.github.user.repo@ea.jar",
            "jar",
        ));
        let locator = GitHubLocator::new(client.clone());
        assert_eq!(
            locator.locate("com.github.user.repo").as_deref(),
            Some("https://github.com/user/repo/releases/download/ea/com.github.user.repo@ea.jar")
        );
        // releases page, then early-access, then ea
        assert_eq!(client.requests().len(), 3);
    }

    #[test]
    fn test_locate_gives_up() {
        let client = Arc::new(MockHttpClient::new());
        let locator = GitHubLocator::new(client.clone());
        assert!(locator.locate("com.github.user.repo").is_none());
        assert_eq!(client.requests().len(), 1 + FALLBACK_TAGS.len());
    }
}

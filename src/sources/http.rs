//! HTTP access used by locators and downloads.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Minimal blocking HTTP interface.
pub trait HttpClient: Send + Sync {
    /// Fetch a text resource; `None` if the server reports it as not found.
    fn get_text(&self, url: &str) -> Result<Option<String>>;

    /// Check whether a resource exists.
    fn exists(&self, url: &str) -> Result<bool>;

    /// Stream a resource into `writer`, returning the number of bytes written.
    fn download(&self, url: &str, writer: &mut dyn Write) -> Result<u64>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Create a client with an optional request timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("dockyard/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to create HTTP client")?;
        Ok(ReqwestClient { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get_text(&self, url: &str) -> Result<Option<String>> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("failed to fetch {}", url))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("failed to fetch {}: HTTP {}", url, response.status());
        }
        let text = response
            .text()
            .with_context(|| format!("failed to read response body of {}", url))?;
        Ok(Some(text))
    }

    fn exists(&self, url: &str) -> Result<bool> {
        tracing::debug!("HEAD {}", url);
        let response = self
            .client
            .head(url)
            .send()
            .with_context(|| format!("failed to probe {}", url))?;
        Ok(response.status().is_success())
    }

    fn download(&self, url: &str, writer: &mut dyn Write) -> Result<u64> {
        tracing::debug!("GET {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("failed to download {}", url))?;

        if !response.status().is_success() {
            bail!("failed to download {}: HTTP {}", url, response.status());
        }
        response
            .copy_to(writer)
            .with_context(|| format!("failed to read response body of {}", url))
    }
}

/// [`HttpClient`] that refuses every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineClient;

impl HttpClient for OfflineClient {
    fn get_text(&self, url: &str) -> Result<Option<String>> {
        bail!("cannot fetch {} in offline mode", url)
    }

    fn exists(&self, url: &str) -> Result<bool> {
        bail!("cannot probe {} in offline mode", url)
    }

    fn download(&self, url: &str, _writer: &mut dyn Write) -> Result<u64> {
        bail!("cannot download {} in offline mode", url)
    }
}

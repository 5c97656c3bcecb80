//! Test utilities and mocks for dockyard unit tests.
//!
//! This module provides mock implementations of the interfaces that reach
//! outside the process: the [`ToolRunner`] that spawns development kit tools
//! and the [`HttpClient`] used by locators and downloads.
//!
//! # Example
//!
//! ```rust,ignore
//! use dockyard::test_support::{MockHttpClient, MockToolRunner};
//!
//! let client = MockHttpClient::new().with_body("https://example.org/a.jar", "jar");
//! let runner = MockToolRunner::new().with_output("jar", ToolOutput::failure(1, "boom"));
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};

use crate::builder::executor::{ToolOutput, ToolRunner};
use crate::sources::http::HttpClient;

pub use fixtures::*;

/// Response of a [`MockToolRunner`] for matching invocations.
#[derive(Debug, Clone)]
enum Response {
    Output(ToolOutput),
    LaunchError,
}

#[derive(Debug, Clone)]
struct Expectation {
    tool: String,
    /// Substring one of the arguments must contain
    needle: Option<String>,
    response: Response,
}

impl Expectation {
    fn matches(&self, tool: &str, args: &[String]) -> bool {
        self.tool == tool
            && self
                .needle
                .as_deref()
                .map_or(true, |needle| args.iter().any(|arg| arg.contains(needle)))
    }
}

/// Mock tool runner recording every invocation.
///
/// Unmatched invocations succeed with empty output. Argument-specific
/// expectations take precedence over tool-wide ones.
#[derive(Debug, Default)]
pub struct MockToolRunner {
    expectations: Vec<Expectation>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockToolRunner {
    pub fn new() -> Self {
        MockToolRunner::default()
    }

    /// Respond to every invocation of `tool` with `output`.
    pub fn with_output(mut self, tool: &str, output: ToolOutput) -> Self {
        self.expectations.push(Expectation {
            tool: tool.to_string(),
            needle: None,
            response: Response::Output(output),
        });
        self
    }

    /// Respond to invocations of `tool` with an argument containing `needle`.
    pub fn with_output_matching(mut self, tool: &str, needle: &str, output: ToolOutput) -> Self {
        self.expectations.push(Expectation {
            tool: tool.to_string(),
            needle: Some(needle.to_string()),
            response: Response::Output(output),
        });
        self
    }

    /// Fail to launch `tool`.
    pub fn with_launch_error(mut self, tool: &str) -> Self {
        self.expectations.push(Expectation {
            tool: tool.to_string(),
            needle: None,
            response: Response::LaunchError,
        });
        self
    }

    /// All invocations in call order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Tool names in call order.
    pub fn tools(&self) -> Vec<String> {
        self.calls().into_iter().map(|(tool, _)| tool).collect()
    }
}

impl ToolRunner for MockToolRunner {
    fn run(&self, tool: &str, args: &[String]) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((tool.to_string(), args.to_vec()));

        let specific = self
            .expectations
            .iter()
            .find(|e| e.needle.is_some() && e.matches(tool, args));
        let general = || self.expectations.iter().find(|e| e.needle.is_none() && e.matches(tool, args));
        match specific.or_else(general).map(|e| &e.response) {
            Some(Response::Output(output)) => Ok(output.clone()),
            Some(Response::LaunchError) => bail!("failed to spawn `{}`", tool),
            None => Ok(ToolOutput::success("")),
        }
    }
}

/// Mock HTTP client serving fixed bodies.
///
/// Unknown URLs are reported as not found; downloading one fails. Every
/// call is counted, including misses.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        MockHttpClient::default()
    }

    /// Serve `body` at `url`.
    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn request(&self, url: &str) -> Option<&Vec<u8>> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());
        self.bodies.get(url)
    }
}

impl HttpClient for MockHttpClient {
    fn get_text(&self, url: &str) -> Result<Option<String>> {
        match self.request(url) {
            Some(body) => Ok(Some(String::from_utf8_lossy(body).into_owned())),
            None => Ok(None),
        }
    }

    fn exists(&self, url: &str) -> Result<bool> {
        Ok(self.request(url).is_some())
    }

    fn download(&self, url: &str, writer: &mut dyn Write) -> Result<u64> {
        let Some(body) = self.request(url) else {
            bail!("failed to download {}: HTTP 404 Not Found", url);
        };
        writer
            .write_all(body)
            .with_context(|| format!("failed to write body of {}", url))?;
        Ok(body.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_tool_runner_precedence() {
        let runner = MockToolRunner::new()
            .with_output("jar", ToolOutput::failure(1, "all"))
            .with_output_matching("jar", "b.jar", ToolOutput::failure(2, "b"));

        let a = runner.run("jar", &["a.jar".to_string()]).unwrap();
        let b = runner.run("jar", &["b.jar".to_string()]).unwrap();
        let javac = runner.run("javac", &[]).unwrap();

        assert_eq!(a.code, 1);
        assert_eq!(b.code, 2);
        assert!(javac.is_success());
        assert_eq!(runner.tools(), vec!["jar", "jar", "javac"]);
    }

    #[test]
    fn test_mock_http_client_counts_misses() {
        let client = MockHttpClient::new().with_body("https://a", "x");
        assert_eq!(client.get_text("https://a").unwrap().as_deref(), Some("x"));
        assert!(!client.exists("https://b").unwrap());

        let mut sink = Vec::new();
        assert!(client.download("https://c", &mut sink).is_err());
        assert_eq!(client.requests().len(), 3);
    }
}

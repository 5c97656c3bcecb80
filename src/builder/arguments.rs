//! Tool argument lists.

use std::path::Path;

/// An ordered list of tool arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    args: Vec<String>,
}

impl Arguments {
    pub fn new() -> Self {
        Arguments::default()
    }

    /// Add a bare argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple bare arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an option followed by its value.
    pub fn with(mut self, option: &str, value: impl Into<String>) -> Self {
        self.args.push(option.to_string());
        self.args.push(value.into());
        self
    }

    /// Add an option followed by a path value.
    pub fn with_path(self, option: &str, path: &Path) -> Self {
        self.with(option, path.display().to_string())
    }

    /// Add an option once per value.
    pub fn with_each(mut self, option: &str, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for value in values {
            self = self.with(option, value);
        }
        self
    }

    /// Add an option and value if `value` is `Some`.
    pub fn with_opt(self, option: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(option, value),
            None => self,
        }
    }

    /// Add a flag if `condition` holds.
    pub fn flag_if(self, condition: bool, flag: &str) -> Self {
        if condition {
            self.arg(flag)
        } else {
            self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn into_vec(self) -> Vec<String> {
        self.args
    }

    /// Value following the first occurrence of `option`.
    pub fn value_of(&self, option: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == option)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

//! Tracking where each configuration value came from.

use std::fmt;

/// Origin of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// A `DEVGREP_*` environment variable.
    Environment,
    /// A command-line flag.
    CommandLine,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Environment => write!(f, "environment"),
            Self::CommandLine => write!(f, "command line"),
        }
    }
}

/// A value together with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
    /// Environment variable name when `source` is `Environment`.
    pub var: Option<String>,
}

impl<T> Sourced<T> {
    pub fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
            var: None,
        }
    }

    pub fn from_env(value: T, var: impl Into<String>) -> Self {
        Self {
            value,
            source: ConfigSource::Environment,
            var: Some(var.into()),
        }
    }

    pub fn from_cli(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::CommandLine,
            var: None,
        }
    }

    /// Replace the value with a command-line override, if one was given.
    pub fn override_with(&mut self, value: Option<T>) {
        if let Some(value) = value {
            *self = Self::from_cli(value);
        }
    }

    /// Human-readable description of the origin, e.g. `env DEVGREP_CACHE_DIR`.
    pub fn describe_source(&self) -> String {
        match (&self.source, &self.var) {
            (ConfigSource::Environment, Some(var)) => format!("env {var}"),
            (source, _) => source.to_string(),
        }
    }
}

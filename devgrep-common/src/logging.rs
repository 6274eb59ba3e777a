//! Tracing subscriber setup.
//!
//! Logs always go to stderr; stdout is reserved for device output.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directive for the env filter, e.g. `warn` or `devgrep_common=debug`.
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: crate::config::DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// `verbose` wins over the configured level.
    pub fn from_config(config: &crate::config::DevgrepConfig, verbose: bool) -> Self {
        let level = if verbose {
            "debug".to_string()
        } else {
            config.log_level.value.clone()
        };
        Self {
            level,
            json: config.json_logs(),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level)
            .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_LEVEL))
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let registry = tracing_subscriber::registry().with(config.filter());
    let result = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

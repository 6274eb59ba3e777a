//! Configuration for devgrep.
//!
//! Values come from built-in defaults, then `DEVGREP_*` environment
//! variables, then command-line flags. Each value remembers its origin.

pub mod env;
pub mod source;

pub use env::{EnvError, EnvParser, expand_home};
pub use source::{ConfigSource, Sourced};

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INVENTORY: &str = "~/.devgrep/inventory.toml";
pub const DEFAULT_CACHE_DIR: &str = "~/.devgrep/tmp";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct DevgrepConfig {
    pub inventory: Sourced<PathBuf>,
    pub cache_dir: Sourced<PathBuf>,
    pub concurrency: Sourced<u32>,
    pub timeout_secs: Sourced<u64>,
    pub log_level: Sourced<String>,
    pub log_format: Sourced<String>,
}

impl DevgrepConfig {
    /// Read every `DEVGREP_*` variable, reporting all invalid ones at once.
    pub fn from_env() -> Result<Self, Vec<EnvError>> {
        let mut parser = EnvParser::new();
        let config = Self {
            inventory: parser.get_path("INVENTORY", DEFAULT_INVENTORY),
            cache_dir: parser.get_path("CACHE_DIR", DEFAULT_CACHE_DIR),
            concurrency: parser.get_u32_range(
                "CONCURRENCY",
                crate::dispatch::DEFAULT_CONCURRENCY as u32,
                1,
                256,
            ),
            timeout_secs: parser.get_u64_range(
                "TIMEOUT_SECS",
                crate::dispatch::DEFAULT_DEVICE_TIMEOUT.as_secs(),
                1,
                3600,
            ),
            log_level: parser.get_log_level("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            log_format: parser.get_choice("LOG_FORMAT", "pretty", &["pretty", "json"]),
        };

        if parser.has_errors() {
            return Err(parser.take_errors());
        }
        Ok(config)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.value)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.value == "json"
    }
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

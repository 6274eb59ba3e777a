//! Error taxonomy for the dispatch engine.
//!
//! Per-device problems are data ([`DeviceFailure`]) and never abort a run.
//! Whole-run preconditions surface as [`EngineError`].

use crate::types::DeviceId;
use thiserror::Error;

/// Closed set of reasons a single device can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Token matched neither a device nor a group in the inventory.
    UnknownDevice,
    /// Host unreachable, connection refused, SSH negotiation failed.
    Connection,
    /// Authentication rejected.
    Auth,
    /// Per-device timeout elapsed.
    Timeout,
    /// The remote command ran but exited unsuccessfully.
    Command,
    /// Cached output could not be read.
    CacheRead,
    /// Output could not be persisted to the cache.
    CacheWrite,
    /// The run was interrupted before this device finished.
    Cancelled,
    /// The device task panicked or was aborted.
    Internal,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::UnknownDevice => "unknown device",
            Self::Connection => "connection error",
            Self::Auth => "authentication error",
            Self::Timeout => "timeout",
            Self::Command => "command failed",
            Self::CacheRead => "cache read error",
            Self::CacheWrite => "cache write error",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why one device produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DeviceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl DeviceFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors that stop a whole run before any output is produced.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Cache-only mode was requested but some targets have no cache file.
    #[error("Some cache files are missing: unable to use --use-cache option.")]
    MissingCache { missing: Vec<DeviceId> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_includes_kind_and_message() {
        let failure = DeviceFailure::new(FailureKind::Timeout, "no response after 30s");
        assert_eq!(failure.to_string(), "timeout: no response after 30s");
    }

    #[test]
    fn test_missing_cache_message() {
        let err = EngineError::MissingCache {
            missing: vec![DeviceId::new("rtr1")],
        };
        assert_eq!(
            err.to_string(),
            "Some cache files are missing: unable to use --use-cache option."
        );
    }
}

//! Common types used across devgrep components.

use crate::errors::DeviceFailure;
use serde::{Deserialize, Serialize};

/// Default SSH port for devices that don't specify one.
pub const DEFAULT_PORT: u16 = 22;

/// Unique identifier for a device within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection parameters handed to the remote-session client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// SSH hostname or IP address.
    pub host: String,
    /// SSH port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Platform hint (e.g. "cisco_ios", "juniper_junos").
    #[serde(default)]
    pub platform: Option<String>,
    /// Login user. Falls back to the SSH client's default when absent.
    #[serde(default)]
    pub user: Option<String>,
    /// Path to an SSH private key.
    #[serde(default)]
    pub identity_file: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionParams {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            platform: None,
            user: None,
            identity_file: None,
        }
    }

    /// `user@host` (or bare `host`) destination string for SSH.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

/// A device the engine can target.
///
/// Records produced from an unknown token carry no connection parameters and
/// fail at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub connection: Option<ConnectionParams>,
}

impl DeviceRecord {
    pub fn new(id: impl Into<String>, connection: ConnectionParams) -> Self {
        Self {
            id: DeviceId::new(id),
            connection: Some(connection),
        }
    }

    /// A pass-through record for a name the inventory doesn't know.
    pub fn unresolved(id: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(id),
            connection: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.connection.is_some()
    }
}

/// Where device output comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Run the command on every device and refresh the cache.
    #[default]
    Live,
    /// Replay cached output; never contact devices.
    CacheOnly,
}

/// Outcome for a single device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOutcome {
    Success(String),
    Failure(DeviceFailure),
}

impl DeviceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Per-device outcomes for one run, in target order.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub outcomes: Vec<(DeviceRecord, DeviceOutcome)>,
}

impl RunResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Failed devices with their failure, in target order.
    pub fn failures(&self) -> impl Iterator<Item = (&DeviceId, &DeviceFailure)> {
        self.outcomes.iter().filter_map(|(device, outcome)| match outcome {
            DeviceOutcome::Failure(failure) => Some((&device.id, failure)),
            DeviceOutcome::Success(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;

    #[test]
    fn test_destination_with_and_without_user() {
        let mut params = ConnectionParams::new("10.0.0.1");
        assert_eq!(params.destination(), "10.0.0.1");
        params.user = Some("admin".to_string());
        assert_eq!(params.destination(), "admin@10.0.0.1");
    }

    #[test]
    fn test_device_id_displays_and_sorts_by_name() {
        let mut ids = vec![DeviceId::new("rtr2"), DeviceId::new("core/1"), DeviceId::new("rtr1")];
        ids.sort();
        let names: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["core/1", "rtr1", "rtr2"]);
    }

    #[test]
    fn test_unresolved_record_has_no_connection() {
        let record = DeviceRecord::unresolved("bad_device");
        assert!(!record.is_resolved());
        assert_eq!(record.id.as_str(), "bad_device");
    }

    #[test]
    fn test_connection_params_port_defaults_when_missing() {
        let params: ConnectionParams = toml::from_str(r#"host = "rtr1.example.net""#).unwrap();
        assert_eq!(params.port, DEFAULT_PORT);
        assert!(params.platform.is_none());
    }

    #[test]
    fn test_run_result_counts() {
        let result = RunResult {
            outcomes: vec![
                (
                    DeviceRecord::new("a", ConnectionParams::new("a")),
                    DeviceOutcome::Success("x".to_string()),
                ),
                (
                    DeviceRecord::unresolved("b"),
                    DeviceOutcome::Failure(DeviceFailure::new(FailureKind::UnknownDevice, "nope")),
                ),
            ],
        };
        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failure_count(), 1);
        let failed: Vec<_> = result.failures().map(|(id, _)| id.as_str()).collect();
        assert_eq!(failed, vec!["b"]);
    }
}

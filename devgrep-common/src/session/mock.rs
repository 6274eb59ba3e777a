//! Scripted remote session for tests.
//!
//! Each device gets a [`MockBehavior`]; unscripted devices fall back to a
//! default. Every call is recorded so tests can assert which devices were
//! contacted and with which command. No sockets are opened.

use super::{RemoteSession, SessionError};
use crate::types::{ConnectionParams, DeviceId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock does when a device is asked to run a command.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return this output.
    Respond(String),
    /// Return this output after a delay.
    Delayed(Duration, String),
    /// Fail with this error.
    Fail(SessionError),
    /// Never answer.
    Hang,
    /// Panic inside the device task.
    Panic,
}

#[derive(Debug, Default)]
struct CallLog {
    calls: Mutex<Vec<(DeviceId, String)>>,
    count: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct MockSession {
    behaviors: Arc<HashMap<DeviceId, MockBehavior>>,
    default_behavior: MockBehavior,
    log: Arc<CallLog>,
}

impl MockSession {
    pub fn builder() -> MockSessionBuilder {
        MockSessionBuilder::default()
    }

    /// Number of `run_command` calls so far.
    pub fn call_count(&self) -> usize {
        self.log.count.load(Ordering::SeqCst)
    }

    /// Recorded `(device, command)` pairs, in call order.
    pub fn calls(&self) -> Vec<(DeviceId, String)> {
        self.log
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn behavior_for(&self, device: &DeviceId) -> MockBehavior {
        self.behaviors
            .get(device)
            .cloned()
            .unwrap_or_else(|| self.default_behavior.clone())
    }
}

impl RemoteSession for MockSession {
    async fn run_command(
        &self,
        device: &DeviceId,
        _params: &ConnectionParams,
        command: &str,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        self.log.count.fetch_add(1, Ordering::SeqCst);
        self.log
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((device.clone(), command.to_string()));

        match self.behavior_for(device) {
            MockBehavior::Respond(output) => Ok(output),
            MockBehavior::Delayed(delay, output) => {
                if delay > timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(SessionError::Timeout(timeout));
                }
                tokio::time::sleep(delay).await;
                Ok(output)
            }
            MockBehavior::Fail(err) => Err(err),
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::Panic => panic!("mock session panic for {device}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockSessionBuilder {
    behaviors: HashMap<DeviceId, MockBehavior>,
    default_behavior: MockBehavior,
}

impl Default for MockSessionBuilder {
    fn default() -> Self {
        Self {
            behaviors: HashMap::new(),
            default_behavior: MockBehavior::Fail(SessionError::Connection(
                "mock: host unreachable".to_string(),
            )),
        }
    }
}

impl MockSessionBuilder {
    /// Script one device.
    pub fn device(mut self, id: impl Into<String>, behavior: MockBehavior) -> Self {
        self.behaviors.insert(DeviceId::new(id), behavior);
        self
    }

    /// Shorthand for a device that answers with `output`.
    pub fn respond(self, id: impl Into<String>, output: impl Into<String>) -> Self {
        self.device(id, MockBehavior::Respond(output.into()))
    }

    /// Behavior for devices without a script. Defaults to a connection failure.
    pub fn default_behavior(mut self, behavior: MockBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    pub fn build(self) -> MockSession {
        MockSession {
            behaviors: Arc::new(self.behaviors),
            default_behavior: self.default_behavior,
            log: Arc::new(CallLog::default()),
        }
    }
}

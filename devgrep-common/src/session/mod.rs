//! Remote-session clients.
//!
//! The engine only knows the [`RemoteSession`] contract: given a device and a
//! command, return the raw output or fail. [`SshSession`] talks to real
//! devices; [`MockSession`] replays scripted behavior for tests.

pub mod mock;
#[cfg(unix)]
pub mod ssh;

pub use mock::{MockBehavior, MockSession, MockSessionBuilder};
#[cfg(unix)]
pub use ssh::{SshOptions, SshSession};

use crate::errors::{DeviceFailure, FailureKind};
use crate::types::{ConnectionParams, DeviceId};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors a remote-session client can raise.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Auth(String),

    #[error("no response after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Command(String),
}

impl From<SessionError> for DeviceFailure {
    fn from(err: SessionError) -> Self {
        let kind = match &err {
            SessionError::Connection(_) => FailureKind::Connection,
            SessionError::Auth(_) => FailureKind::Auth,
            SessionError::Timeout(_) => FailureKind::Timeout,
            SessionError::Command(_) => FailureKind::Command,
        };
        DeviceFailure::new(kind, err.to_string())
    }
}

/// Run one command on one device.
///
/// Implementations must return within roughly `timeout`; the dispatcher also
/// enforces it as a backstop.
pub trait RemoteSession: Send + Sync + 'static {
    fn run_command(
        &self,
        device: &DeviceId,
        params: &ConnectionParams,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;
}

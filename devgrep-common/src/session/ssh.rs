//! SSH-backed remote session using the system `ssh` binary.

use super::{RemoteSession, SessionError};
use crate::types::{ConnectionParams, DeviceId};
use crate::util::mask_sensitive_command;
use openssh::{KnownHosts, Session, SessionBuilder};
use std::time::{Duration, Instant};
use tracing::debug;

/// Options applied to every SSH connection.
#[derive(Debug, Clone)]
pub struct SshOptions {
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
    /// Host key policy.
    pub known_hosts: KnownHosts,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            known_hosts: KnownHosts::Add,
        }
    }
}

/// One fresh SSH connection per command.
#[derive(Debug, Clone, Default)]
pub struct SshSession {
    options: SshOptions,
}

impl SshSession {
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    fn builder(&self, params: &ConnectionParams, timeout: Duration) -> SessionBuilder {
        let mut builder = SessionBuilder::default();
        builder
            .port(params.port)
            .connect_timeout(self.options.connect_timeout.min(timeout))
            .known_hosts_check(self.options.known_hosts.clone());
        if let Some(user) = &params.user {
            builder.user(user.clone());
        }
        if let Some(key) = &params.identity_file {
            builder.keyfile(key);
        }
        builder
    }

    async fn connect_and_run(
        &self,
        params: &ConnectionParams,
        command: &str,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        let session = self
            .builder(params, timeout)
            .connect(&params.host)
            .await
            .map_err(classify_connect_error)?;

        let output = session.raw_command(command).output().await;
        let _ = session.close().await;
        let output = output.map_err(|e| SessionError::Connection(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SessionError::Command(format!(
                "exit={} stderr={}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RemoteSession for SshSession {
    async fn run_command(
        &self,
        device: &DeviceId,
        params: &ConnectionParams,
        command: &str,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        let start = Instant::now();
        debug!(
            device = %device,
            destination = %params.destination(),
            port = params.port,
            command = %mask_sensitive_command(command),
            "running remote command"
        );

        let result = tokio::time::timeout(timeout, self.connect_and_run(params, command, timeout))
            .await
            .unwrap_or(Err(SessionError::Timeout(timeout)));

        debug!(
            device = %device,
            ok = result.is_ok(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "remote command finished"
        );
        result
    }
}

fn classify_connect_error(err: openssh::Error) -> SessionError {
    let message = err.to_string();
    classify_message(message)
}

fn classify_message(message: String) -> SessionError {
    let lower = message.to_lowercase();
    if lower.contains("permission denied") || lower.contains("authentication") {
        SessionError::Auth(message)
    } else if lower.contains("timed out") {
        SessionError::Connection(format!("connection timed out: {message}"))
    } else {
        SessionError::Connection(message)
    }
}

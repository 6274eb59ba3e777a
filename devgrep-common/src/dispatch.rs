//! Dispatch engine: one command fanned out to every target device.
//!
//! Live runs spawn one task per device, capped by a semaphore, and join them
//! in target order. Each task is its own failure domain: errors, timeouts,
//! cancellation and panics all become a `Failure` for that device only, so
//! every target ends up with exactly one outcome.
//!
//! Cache-only runs verify the cache up front and never touch the network.

use crate::cache::CacheStore;
use crate::cancel::{CancelReason, CancelToken};
use crate::errors::{DeviceFailure, EngineError, FailureKind};
use crate::resolve::TargetSet;
use crate::session::RemoteSession;
use crate::types::{DeviceOutcome, DeviceRecord, DispatchMode, RunResult};
use crate::util::mask_sensitive_command;
use crate::validity;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default number of devices contacted at once.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Default per-device timeout.
pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(30);

/// Dispatch tuning.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum devices in flight.
    pub concurrency: usize,
    /// Bound on each device's remote call.
    pub device_timeout: Duration,
    /// Optional bound on the whole run; expiry cancels in-flight devices.
    pub run_deadline: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            device_timeout: DEFAULT_DEVICE_TIMEOUT,
            run_deadline: None,
        }
    }
}

pub struct Dispatcher<S> {
    session: Arc<S>,
    cache: CacheStore,
    config: DispatchConfig,
}

impl<S: RemoteSession> Dispatcher<S> {
    pub fn new(session: S, cache: CacheStore, config: DispatchConfig) -> Self {
        Self {
            session: Arc::new(session),
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Obtain every target's output, live or from the cache.
    ///
    /// Only cache-only mode can fail as a whole (missing cache files).
    pub async fn dispatch(
        &self,
        targets: &TargetSet,
        command: &str,
        mode: DispatchMode,
        cancel: &CancelToken,
    ) -> Result<RunResult, EngineError> {
        let start = Instant::now();
        let result = match mode {
            DispatchMode::Live => self.dispatch_live(targets, command, cancel).await,
            DispatchMode::CacheOnly => self.dispatch_cached(targets)?,
        };

        info!(
            mode = ?mode,
            devices = result.len(),
            succeeded = result.success_count(),
            failed = result.failure_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "dispatch complete"
        );
        Ok(result)
    }

    async fn dispatch_live(
        &self,
        targets: &TargetSet,
        command: &str,
        cancel: &CancelToken,
    ) -> RunResult {
        info!(
            devices = targets.len(),
            concurrency = self.config.concurrency,
            timeout_ms = self.config.device_timeout.as_millis() as u64,
            command = %mask_sensitive_command(command),
            "dispatching command"
        );

        let deadline = self.config.run_deadline.map(|limit| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                cancel.cancel(CancelReason::Deadline);
            })
        });

        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let command: Arc<str> = Arc::from(command);

        let handles: Vec<(DeviceRecord, JoinHandle<DeviceOutcome>)> = targets
            .devices()
            .iter()
            .map(|device| {
                let task = DeviceTask {
                    session: Arc::clone(&self.session),
                    cache: self.cache.clone(),
                    device: device.clone(),
                    command: Arc::clone(&command),
                    timeout: self.config.device_timeout,
                    permits: Arc::clone(&permits),
                    cancel: cancel.clone(),
                };
                (device.clone(), tokio::spawn(task.run()))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (device, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    let message = if join_err.is_panic() {
                        "device task panicked"
                    } else {
                        "device task aborted"
                    };
                    DeviceOutcome::Failure(DeviceFailure::new(FailureKind::Internal, message))
                }
            };
            log_outcome(&device, &outcome);
            outcomes.push((device, outcome));
        }

        if let Some(timer) = deadline {
            timer.abort();
        }

        RunResult { outcomes }
    }

    fn dispatch_cached(&self, targets: &TargetSet) -> Result<RunResult, EngineError> {
        validity::verify(targets, &self.cache)?;

        let outcomes = targets
            .devices()
            .iter()
            .map(|device| {
                let outcome = match self.cache.read(&device.id) {
                    Ok(content) => DeviceOutcome::Success(content),
                    Err(e) => DeviceOutcome::Failure(DeviceFailure::new(
                        FailureKind::CacheRead,
                        e.to_string(),
                    )),
                };
                log_outcome(device, &outcome);
                (device.clone(), outcome)
            })
            .collect();

        Ok(RunResult { outcomes })
    }
}

/// Everything one device task owns.
struct DeviceTask<S> {
    session: Arc<S>,
    cache: CacheStore,
    device: DeviceRecord,
    command: Arc<str>,
    timeout: Duration,
    permits: Arc<Semaphore>,
    cancel: CancelToken,
}

impl<S: RemoteSession> DeviceTask<S> {
    async fn run(self) -> DeviceOutcome {
        let cancel = self.cancel.clone();
        tokio::select! {
            biased;
            reason = cancel.cancelled() => {
                let failure = DeviceFailure::new(FailureKind::Cancelled, reason.to_string());
                DeviceOutcome::Failure(failure)
            }
            result = self.execute() => match result {
                Ok(output) => DeviceOutcome::Success(output),
                Err(failure) => DeviceOutcome::Failure(failure),
            },
        }
    }

    async fn execute(self) -> Result<String, DeviceFailure> {
        let Some(params) = self.device.connection.as_ref() else {
            return Err(DeviceFailure::new(
                FailureKind::UnknownDevice,
                format!("'{}' is not a known device or group", self.device.id),
            ));
        };

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| DeviceFailure::new(FailureKind::Internal, "dispatch pool closed"))?;

        debug!(device = %self.device.id, host = %params.host, "contacting device");
        let call = self
            .session
            .run_command(&self.device.id, params, &self.command, self.timeout);
        let output = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => {
                return Err(DeviceFailure::new(
                    FailureKind::Timeout,
                    format!("no response after {:?}", self.timeout),
                ));
            }
        };

        // File writes and fsync block; keep them off the async workers.
        let cache = self.cache.clone();
        let id = self.device.id.clone();
        tokio::task::spawn_blocking(move || cache.write(&id, &output).map(|_| output))
            .await
            .map_err(|e| {
                DeviceFailure::new(FailureKind::Internal, format!("cache writer failed: {e}"))
            })?
            .map_err(|e| DeviceFailure::new(FailureKind::CacheWrite, e.to_string()))
    }
}

fn log_outcome(device: &DeviceRecord, outcome: &DeviceOutcome) {
    match outcome {
        DeviceOutcome::Success(output) => {
            debug!(device = %device.id, bytes = output.len(), "device succeeded");
        }
        DeviceOutcome::Failure(failure) => {
            warn!(device = %device.id, kind = %failure.kind, "device failed: {}", failure.message);
        }
    }
}

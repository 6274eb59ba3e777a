//! Run-wide cancellation.
//!
//! One token is shared by every device task of a run. Cancelling it makes
//! in-flight tasks finish as `Cancelled` failures; completed devices keep
//! their results.

use std::sync::Arc;
use tokio::sync::watch;

/// Why a run was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Interrupted by the user (Ctrl-C).
    Interrupted,
    /// The run-wide deadline elapsed.
    Deadline,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupted => write!(f, "run interrupted"),
            Self::Deadline => write!(f, "run deadline exceeded"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<Option<CancelReason>>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Cancel the run. The first reason wins.
    pub fn cancel(&self, reason: CancelReason) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn reason(&self) -> Option<CancelReason> {
        *self.tx.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) -> CancelReason {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

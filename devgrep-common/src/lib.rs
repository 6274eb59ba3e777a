//! Device dispatch and cache engine for devgrep.
//!
//! Resolves device and group names, runs one command on every target
//! concurrently (or replays cached output), persists each device's output,
//! and merges the results into one annotated stream.

pub mod aggregate;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod inventory;
pub mod logging;
pub mod resolve;
pub mod session;
pub mod types;
pub mod util;
pub mod validity;

pub use aggregate::{Aggregate, TaggedLine, aggregate};
pub use cache::{CacheError, CacheStore};
pub use cancel::{CancelReason, CancelToken};
pub use config::DevgrepConfig;
pub use dispatch::{DispatchConfig, Dispatcher};
pub use errors::{DeviceFailure, EngineError, FailureKind};
pub use inventory::{ALL_GROUP, Inventory, InventoryError, StaticInventory};
pub use resolve::{TargetSet, resolve};
pub use session::{MockBehavior, MockSession, RemoteSession, SessionError};
#[cfg(unix)]
pub use session::{SshOptions, SshSession};
pub use types::{ConnectionParams, DeviceId, DeviceOutcome, DeviceRecord, DispatchMode, RunResult};
pub use util::mask_sensitive_command;

//! Cache-validity check for cache-only runs.

use crate::cache::CacheStore;
use crate::errors::EngineError;
use crate::resolve::TargetSet;
use tracing::warn;

/// Fail unless every target has a cache file.
///
/// Cache-only runs are all-or-nothing: a single missing entry rejects the
/// whole run before anything is read or printed.
pub fn verify(targets: &TargetSet, cache: &CacheStore) -> Result<(), EngineError> {
    let missing: Vec<_> = cache.missing(targets).into_iter().cloned().collect();
    if missing.is_empty() {
        return Ok(());
    }

    for device in &missing {
        warn!(device = %device, path = %cache.path_for(device).display(), "cache file missing");
    }
    Err(EngineError::MissingCache { missing })
}

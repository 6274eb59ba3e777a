//! Per-device output cache.
//!
//! Each device's raw output lives in `<root>/<device>.txt`. Writes go through
//! a uniquely named temp file in the same directory and are renamed into
//! place, so a concurrent reader sees either the old or the new content.

use crate::resolve::TargetSet;
use crate::types::DeviceId;
use std::fs::{self, File};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const CACHE_EXTENSION: &str = "txt";

/// Errors from cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cached output for '{device}' at {path}")]
    NotFound { device: DeviceId, path: PathBuf },

    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Filesystem cache rooted at an explicit directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `root`. Relative roots are made absolute
    /// against the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&root))
                .unwrap_or(root)
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache root if it doesn't exist. Idempotent.
    pub fn ensure_root(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root).map_err(|e| CacheError::io(&self.root, e))
    }

    /// Stable path for a device's cached output.
    pub fn path_for(&self, device: &DeviceId) -> PathBuf {
        self.root
            .join(format!("{}.{}", file_stem(device.as_str()), CACHE_EXTENSION))
    }

    pub fn exists(&self, device: &DeviceId) -> bool {
        self.path_for(device).is_file()
    }

    /// Atomically replace the cached output for `device`.
    pub fn write(&self, device: &DeviceId, content: &str) -> Result<PathBuf, CacheError> {
        self.ensure_root()?;
        let path = self.path_for(device);
        let temp_path = self.root.join(format!(
            ".{}.{}.tmp",
            file_stem(device.as_str()),
            uuid::Uuid::new_v4().simple()
        ));

        let written = (|| {
            let mut file = File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })();

        if let Err(e) = written.and_then(|()| fs::rename(&temp_path, &path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(&path, e));
        }

        debug!(device = %device, path = %path.display(), bytes = content.len(), "cached output");
        Ok(path)
    }

    pub fn read(&self, device: &DeviceId) -> Result<String, CacheError> {
        let path = self.path_for(device);
        match fs::read(&path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CacheError::NotFound {
                device: device.clone(),
                path,
            }),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// Cached entries currently on disk, sorted by device id.
    ///
    /// A missing root yields an empty list.
    pub fn entries(&self) -> Result<Vec<(DeviceId, PathBuf)>, CacheError> {
        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(&self.root, e)),
        };

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| CacheError::io(&self.root, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(id) = decode_stem(stem) else {
                continue;
            };
            entries.push((DeviceId::new(id), path));
        }
        entries.sort();
        Ok(entries)
    }

    /// Targets with no cache file.
    pub fn missing<'a>(&self, targets: &'a TargetSet) -> Vec<&'a DeviceId> {
        targets.ids().filter(|id| !self.exists(id)).collect()
    }
}

/// Map a device id to a file stem, reversibly.
///
/// ASCII alphanumerics, `-`, `_` and non-leading `.` are kept; every other
/// byte (including `%`) becomes `%XX`. Distinct ids never share a file. The
/// empty id is stored as a bare `%`.
fn file_stem(id: &str) -> String {
    if id.is_empty() {
        return "%".to_string();
    }
    let mut stem = String::with_capacity(id.len());
    for (i, byte) in id.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && i > 0);
        if keep {
            stem.push(byte as char);
        } else {
            let _ = write!(stem, "%{byte:02X}");
        }
    }
    stem
}

/// Inverse of [`file_stem`]. `None` for names this store did not produce.
fn decode_stem(stem: &str) -> Option<String> {
    if stem == "%" {
        return Some(String::new());
    }
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    let id = String::from_utf8(out).ok()?;
    (file_stem(&id) == stem).then_some(id)
}

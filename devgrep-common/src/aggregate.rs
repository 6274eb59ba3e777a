//! Merging per-device results into one annotated stream.

use crate::cache::CacheStore;
use crate::errors::DeviceFailure;
use crate::types::{DeviceId, DeviceOutcome, RunResult};
use std::fmt::Write as _;
use std::path::PathBuf;

/// One output line and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine {
    pub device: DeviceId,
    /// Cache file holding this device's output.
    pub source: PathBuf,
    pub line: String,
}

impl TaggedLine {
    /// `<path>:<line>` when prefixed, the bare line otherwise.
    pub fn render(&self, prefixed: bool) -> String {
        if prefixed {
            format!("{}:{}", self.source.display(), self.line)
        } else {
            self.line.clone()
        }
    }
}

/// Merged view of a run: successful lines plus the failed devices.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    /// Lines in target order, then source order within each device.
    pub lines: Vec<TaggedLine>,
    /// Failures in target order.
    pub failures: Vec<(DeviceId, DeviceFailure)>,
    /// Whether lines carry a `<path>:` prefix (more than one target).
    pub prefixed: bool,
}

pub fn aggregate(result: &RunResult, cache: &CacheStore) -> Aggregate {
    let mut merged = Aggregate {
        prefixed: result.len() > 1,
        ..Aggregate::default()
    };

    for (device, outcome) in &result.outcomes {
        match outcome {
            DeviceOutcome::Success(output) => {
                let source = cache.path_for(&device.id);
                merged.lines.extend(output.lines().map(|line| TaggedLine {
                    device: device.id.clone(),
                    source: source.clone(),
                    line: line.to_string(),
                }));
            }
            DeviceOutcome::Failure(failure) => {
                merged.failures.push((device.id.clone(), failure.clone()));
            }
        }
    }
    merged
}

impl Aggregate {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Failed device ids, sorted.
    pub fn failed_ids(&self) -> Vec<&DeviceId> {
        let mut ids: Vec<_> = self.failures.iter().map(|(id, _)| id).collect();
        ids.sort();
        ids
    }

    /// Render the kept lines, then the `Failed devices:` section unless hidden.
    pub fn render(&self, mut keep: impl FnMut(&TaggedLine) -> bool, hide_failed: bool) -> String {
        let mut out = String::new();
        for line in self.lines.iter().filter(|l| keep(*l)) {
            out.push_str(&line.render(self.prefixed));
            out.push('\n');
        }

        if self.has_failures() && !hide_failed {
            out.push_str("\nFailed devices:\n");
            for id in self.failed_ids() {
                let _ = writeln!(out, "{id}");
            }
        }
        out
    }
}

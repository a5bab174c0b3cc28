//! Snapshot evidence captured along a workflow.
//!
//! Capturing evidence never fails a workflow: a screenshot or write error is
//! kept on the [`SnapshotRef`] instead of being returned.

use crate::result::ProbeResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reference to one captured snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRef {
    /// Caller-supplied label
    pub label: String,
    /// Capture order within the session, starting at 1
    pub sequence: u32,
    /// File the PNG was written to, when an artifacts directory is set
    pub path: Option<PathBuf>,
    /// PNG size in bytes (0 when capture failed)
    pub bytes: usize,
    /// Capture or write failure
    pub error: Option<String>,
}

impl SnapshotRef {
    /// Whether the screenshot was captured
    #[must_use]
    pub const fn is_captured(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-session snapshot sink
#[derive(Debug, Clone, Default)]
pub struct EvidenceStore {
    dir: Option<PathBuf>,
    counter: u32,
}

impl EvidenceStore {
    /// Keep references only, write nothing
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Write snapshots under `root/<session_id>/`
    #[must_use]
    pub fn under(root: &Path, session_id: &str) -> Self {
        Self {
            dir: Some(root.join(session_id)),
            counter: 0,
        }
    }

    /// Directory snapshots are written to
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Number of snapshots recorded so far
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.counter
    }

    /// Record the outcome of a screenshot attempt
    pub fn record(&mut self, label: &str, capture: ProbeResult<Vec<u8>>) -> SnapshotRef {
        self.counter += 1;
        let mut snapshot = SnapshotRef {
            label: label.to_string(),
            sequence: self.counter,
            path: None,
            bytes: 0,
            error: None,
        };

        let png = match capture {
            Ok(png) => png,
            Err(e) => {
                tracing::warn!(label, error = %e, "snapshot capture failed");
                snapshot.error = Some(e.to_string());
                return snapshot;
            }
        };
        snapshot.bytes = png.len();

        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{:03}_{}.png", self.counter, sanitize(label)));
            match std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, &png)) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), bytes = png.len(), "snapshot written");
                    snapshot.path = Some(path);
                }
                Err(e) => {
                    tracing::warn!(label, error = %e, "snapshot write failed");
                    snapshot.error = Some(e.to_string());
                }
            }
        }
        snapshot
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

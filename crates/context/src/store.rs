//! Snapshot store reader — the structured memory file.
//!
//! The snapshot is a single JSON object maintained by an external writer.
//! Reads are wholesale; a cheap modification-time check gates the full
//! read-and-diff so an unchanged file costs one `stat` per poll tick.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sitara_core::error::StoreError;
use sitara_core::snapshot::ContextSnapshot;
use tracing::debug;

/// Last-observed modification time of the snapshot file.
///
/// `None` until the file has been seen once. In-process only; resets on
/// restart.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapshotWatermark(Option<SystemTime>);

/// Reader for the structured memory snapshot file.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full current snapshot.
    ///
    /// A missing file is an empty snapshot (the writer may not have
    /// produced one yet). I/O failures are [`StoreError::Unavailable`] and
    /// content that is not a JSON object is [`StoreError::Malformed`];
    /// callers treat both as "no change since last success".
    pub fn read_snapshot(&self) -> Result<ContextSnapshot, StoreError> {
        if !self.path.exists() {
            return Ok(ContextSnapshot::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::Unavailable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        serde_json::from_str::<ContextSnapshot>(&content).map_err(|e| StoreError::Malformed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Cheap change check: compare the file's modification time against
    /// the watermark before paying for a full read and diff.
    ///
    /// A missing or unstattable file reports "unchanged" with the
    /// watermark untouched.
    pub fn has_changed(&self, last: &SnapshotWatermark) -> (bool, SnapshotWatermark) {
        let mtime = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => return (false, *last),
        };

        match last.0 {
            Some(seen) if mtime <= seen => (false, *last),
            _ => {
                debug!(path = %self.path.display(), "Snapshot modification detected");
                (true, SnapshotWatermark(Some(mtime)))
            }
        }
    }
}

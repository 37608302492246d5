//! Update queue reader — the append-only NDJSON request file.
//!
//! External writers append one JSON object per line:
//! `{"text": "...", "conversation_id": "optional target"}`. The reader
//! only consumes bytes past its byte-offset watermark, so each line is
//! processed at most once per process lifetime. Malformed lines are
//! skipped individually; they never abort a batch.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sitara_core::error::StoreError;
use sitara_core::update::PendingUpdate;
use tracing::{debug, warn};

/// One queue line as written by external producers.
///
/// The text may arrive under either `text` or `message`; `text` wins when
/// both are present.
#[derive(Debug, Serialize, Deserialize)]
struct QueueRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
}

impl QueueRecord {
    fn into_update(self) -> Option<PendingUpdate> {
        let text = self.text.or(self.message)?;
        if text.is_empty() {
            return None;
        }
        Some(PendingUpdate {
            text,
            target: self.conversation_id,
        })
    }
}

/// Positional reader (and appender) for the update queue file.
#[derive(Debug, Clone)]
pub struct UpdateQueue {
    path: PathBuf,
}

impl UpdateQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records appended since `offset`.
    ///
    /// Returns the parsed records and the new offset. A missing file, or a
    /// file that has not grown past `offset`, yields no records with the
    /// offset unchanged. Individual lines that fail to parse or carry no
    /// text are skipped with a warning.
    pub fn read_new(&self, offset: u64) -> Result<(Vec<PendingUpdate>, u64), StoreError> {
        if !self.path.exists() {
            return Ok((Vec::new(), offset));
        }

        let mut file = std::fs::File::open(&self.path).map_err(|e| StoreError::Unavailable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let len = file
            .metadata()
            .map_err(|e| StoreError::Unavailable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?
            .len();
        if len <= offset {
            return Ok((Vec::new(), offset));
        }

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| StoreError::Unavailable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut appended = String::new();
        file.read_to_string(&mut appended)
            .map_err(|e| StoreError::Unavailable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let updates: Vec<PendingUpdate> = appended
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<QueueRecord>(line) {
                Ok(record) => record.into_update(),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed update queue line");
                    None
                }
            })
            .collect();

        debug!(
            count = updates.len(),
            offset = len,
            "Read update queue records"
        );
        Ok((updates, len))
    }

    /// Append one record for later pickup (the `enqueue` command's side of
    /// the queue). Creates the file and parent directories on first use.
    pub fn append(&self, text: &str, conversation_id: Option<&str>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let record = QueueRecord {
            text: Some(text.to_string()),
            message: None,
            conversation_id: conversation_id.map(str::to_string),
        };
        let line = serde_json::to_string(&record).map_err(|e| StoreError::Malformed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::Unavailable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        writeln!(file, "{line}").map_err(|e| StoreError::Unavailable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_yields_nothing() {
        let queue = UpdateQueue::new("/tmp/sitara_test_missing_queue.ndjson");
        let (updates, offset) = queue.read_new(0).unwrap();
        assert!(updates.is_empty());
        assert_eq!(offset, 0);
    }

    #[test]
    fn reads_only_appended_lines() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#"{{"text": "first"}}"#).unwrap();
        tmp.flush().unwrap();

        let queue = UpdateQueue::new(tmp.path());
        let (updates, offset) = queue.read_new(0).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].text, "first");

        // Nothing new yet
        let (updates, offset2) = queue.read_new(offset).unwrap();
        assert!(updates.is_empty());
        assert_eq!(offset2, offset);

        // Append and read again from the watermark
        writeln!(tmp, r#"{{"text": "second", "conversation_id": "S9"}}"#).unwrap();
        tmp.flush().unwrap();
        let (updates, _) = queue.read_new(offset).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].text, "second");
        assert_eq!(updates[0].target.as_deref(), Some("S9"));
    }

    #[test]
    fn malformed_lines_are_skipped_individually() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#"{{"text": "good one"}}"#).unwrap();
        writeln!(tmp, "not json at all").unwrap();
        writeln!(tmp, r#"{{"conversation_id": "S1"}}"#).unwrap(); // no text
        writeln!(tmp, r#"{{"message": "via message field"}}"#).unwrap();
        tmp.flush().unwrap();

        let queue = UpdateQueue::new(tmp.path());
        let (updates, _) = queue.read_new(0).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].text, "good one");
        assert_eq!(updates[1].text, "via message field");
    }

    #[test]
    fn text_wins_over_message() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#"{{"text": "primary", "message": "fallback"}}"#).unwrap();
        tmp.flush().unwrap();

        let queue = UpdateQueue::new(tmp.path());
        let (updates, _) = queue.read_new(0).unwrap();
        assert_eq!(updates[0].text, "primary");
    }

    #[test]
    fn append_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buffer").join("updates.ndjson");

        let queue = UpdateQueue::new(&path);
        queue.append("birth chart updated", None).unwrap();
        queue.append("for one session only", Some("S2")).unwrap();

        let (updates, _) = queue.read_new(0).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].target, None);
        assert_eq!(updates[1].target.as_deref(), Some("S2"));
    }
}

//! Best-effort transcript persistence.
//!
//! Appends `U:`/`A:` lines to a configured file as turns arrive. Failures
//! are logged and swallowed; losing a log line must never affect the live
//! session.

use std::io::Write;
use std::path::PathBuf;

use sitara_core::transcript::Role;
use tracing::warn;

/// Appender for the on-disk transcript log.
pub struct TranscriptLogger {
    path: Option<PathBuf>,
}

impl TranscriptLogger {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Whether a log file is configured.
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Append one turn. Best-effort: errors are logged, never returned.
    pub fn append(&self, role: Role, text: &str) {
        let Some(path) = &self.path else {
            return;
        };

        let prefix = match role {
            Role::User => "U",
            Role::Agent => "A",
        };

        if let Err(e) = self.try_append(path, prefix, text) {
            warn!(error = %e, path = %path.display(), "Failed to append transcript line");
        }
    }

    fn try_append(&self, path: &PathBuf, prefix: &str, text: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{prefix}: {text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_prefixed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("transcript.log");

        let logger = TranscriptLogger::new(Some(path.clone()));
        logger.append(Role::User, "what does my chart say?");
        logger.append(Role::Agent, "Jupiter is on your side.");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "U: what does my chart say?\nA: Jupiter is on your side.\n"
        );
    }

    #[test]
    fn disabled_logger_writes_nothing() {
        let logger = TranscriptLogger::new(None);
        assert!(!logger.is_enabled());
        // Must not panic
        logger.append(Role::User, "hello");
    }
}

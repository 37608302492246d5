//! Pending update records — units of context change awaiting forwarding.
//!
//! Records come from two origins: a diff of successive context snapshots
//! (reduced to a changed-key summary) and lines appended to the external
//! update queue. Records are never buffered across poll ticks: a record
//! that cannot be delivered right now is dropped, and the next natural
//! change produces a fresh one.

use serde::{Deserialize, Serialize};

/// How many changed key names the snapshot summary lists before collapsing
/// the remainder into a count. Caps update message size deterministically.
pub const SUMMARY_KEY_LIMIT: usize = 8;

/// A unit of context change to forward into the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    /// Free-text summary of the change.
    pub text: String,

    /// Target session id. When set, the record only applies to that
    /// session; there is no cross-session buffering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl PendingUpdate {
    /// An untargeted record, applicable to whatever session is active.
    pub fn broadcast(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: None,
        }
    }

    /// A record addressed to one specific session.
    pub fn targeted(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: Some(session_id.into()),
        }
    }

    /// Whether this record applies to the session identified by
    /// `current_id`. A set target that does not match (including when no
    /// session id is known yet) means the record must be dropped.
    pub fn applies_to(&self, current_id: Option<&str>) -> bool {
        match &self.target {
            None => true,
            Some(target) => current_id == Some(target.as_str()),
        }
    }

    /// Build the per-tick snapshot-diff record: up to the first
    /// [`SUMMARY_KEY_LIMIT`] changed key names, plus a count of the rest.
    ///
    /// Returns `None` for an empty change set.
    pub fn from_changed_keys(changed: &[String]) -> Option<Self> {
        if changed.is_empty() {
            return None;
        }

        let mut summary = String::from("Context update: ");
        summary.push_str(
            &changed
                .iter()
                .take(SUMMARY_KEY_LIMIT)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
        if changed.len() > SUMMARY_KEY_LIMIT {
            summary.push_str(&format!(" (+{} more)", changed.len() - SUMMARY_KEY_LIMIT));
        }

        Some(Self::broadcast(summary))
    }
}

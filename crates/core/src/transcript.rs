//! Rolling transcript — the in-memory turn history of the active session.
//!
//! Append-only and scoped to one session: a new session starts from an
//! empty transcript. Unbounded growth is acceptable for a single session's
//! lifetime; callers needing history request a bounded suffix.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A single conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
        }
    }
}

/// Ordered, append-only sequence of turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

/// Shared transcript handle: the receive loop appends, tools read a
/// bounded suffix.
#[derive(Clone, Default)]
pub struct SharedTranscript(Arc<RwLock<Transcript>>);

impl SharedTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, turn: Turn) {
        self.0.write().await.push(turn);
    }

    pub async fn len(&self) -> usize {
        self.0.read().await.len()
    }

    /// Clone of the last `n` turns, oldest first.
    pub async fn recent(&self, n: usize) -> Vec<Turn> {
        self.0.read().await.recent(n).to_vec()
    }
}

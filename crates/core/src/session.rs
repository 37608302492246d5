//! Session handle — the identity and lifecycle state of the one active
//! remote conversation.
//!
//! Exactly one session is live per process. The transport's receive loop
//! owns every state transition; everything else (the synchronizer, tools,
//! observers) only reads the handle through [`SharedSessionHandle`].

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Connection lifecycle of the remote session.
///
/// `Active → Closed` directly is the unexpected-disconnect path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Initiating,
    Active,
    Closing,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Initiating => "initiating",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// One active remote conversation: its lifecycle state plus the session id
/// the remote side assigned at initiation (absent until then).
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: SessionState,
    conversation_id: Option<String>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            conversation_id: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Whether contextual updates may be sent right now.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, read-mostly access to the session handle.
///
/// Mutators are intended for the transport's receive loop only; all other
/// components use [`snapshot`](Self::snapshot) or the convenience readers.
#[derive(Clone, Default)]
pub struct SharedSessionHandle(Arc<RwLock<SessionHandle>>);

impl SharedSessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state and conversation id as one consistent read.
    pub async fn snapshot(&self) -> SessionHandle {
        self.0.read().await.clone()
    }

    pub async fn state(&self) -> SessionState {
        self.0.read().await.state
    }

    pub async fn conversation_id(&self) -> Option<String> {
        self.0.read().await.conversation_id.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.0.read().await.is_active()
    }

    /// Transition to a new lifecycle state. Transport use only.
    pub async fn set_state(&self, next: SessionState) {
        let mut guard = self.0.write().await;
        if guard.state == next {
            return;
        }
        debug!(from = %guard.state, to = %next, "Session state transition");
        guard.state = next;
    }

    /// Mark the session active with the remote-assigned conversation id.
    /// Transport use only, on receipt of the initiation acknowledgment.
    pub async fn activate(&self, conversation_id: impl Into<String>) {
        let mut guard = self.0.write().await;
        let id = conversation_id.into();
        if guard.state != SessionState::Initiating {
            warn!(
                state = %guard.state,
                "Initiation acknowledgment arrived outside the initiating state"
            );
        }
        guard.conversation_id = Some(id);
        guard.state = SessionState::Active;
    }

    /// Invalidate the handle when the transport closes (normal or error).
    pub async fn close(&self) {
        let mut guard = self.0.write().await;
        guard.state = SessionState::Closed;
    }
}

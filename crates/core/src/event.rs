//! Session event bus — decoupled observation of the live session.
//!
//! The transport publishes what happens (session ready, turns, closure);
//! observers such as the console printer and the transcript log subscribe
//! without the transport knowing about them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::transcript::Role;

/// Observable milestones of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The remote side acknowledged initiation and assigned a session id.
    SessionReady { conversation_id: String },

    /// A transcript turn arrived (user or agent).
    Turn { role: Role, text: String },

    /// The connection closed, normally or not.
    SessionClosed { reason: Option<String> },
}

/// A broadcast-based event bus for session events.
///
/// Components subscribe to receive all events and filter for what they
/// care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<SessionEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: SessionEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SessionEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(SessionEvent::Turn {
            role: Role::User,
            text: "what does my chart say?".into(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            SessionEvent::Turn { role, text } => {
                assert_eq!(*role, Role::User);
                assert!(text.contains("chart"));
            }
            _ => panic!("Expected Turn event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(SessionEvent::SessionClosed { reason: None });
    }
}

//! Built-in client tool implementations for Sitara.
//!
//! The remote agent can ask the client mid-conversation for state only the
//! client holds: the current memory snapshot and the recent conversation
//! history. Tool names match what is configured on the remote agent.

pub mod conversation_history;
pub mod memory_buffer;

use sitara_context::ContextStore;
use sitara_core::tool::ToolRegistry;
use sitara_core::transcript::SharedTranscript;

/// Create the default tool registry wired to the local state sources.
pub fn default_registry(
    store: ContextStore,
    transcript: SharedTranscript,
    recent_max: usize,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(memory_buffer::MemoryBufferTool::new(store)));
    registry.register(Box::new(
        conversation_history::ConversationHistoryTool::new(transcript, recent_max),
    ));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_both_tools() {
        let registry = default_registry(
            ContextStore::new("/tmp/sitara_test_registry.json"),
            SharedTranscript::new(),
            10,
        );
        assert!(registry.get("getMemoryBuffer").is_some());
        assert!(registry.get("getConversationHistory").is_some());
    }
}

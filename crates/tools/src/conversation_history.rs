//! `getConversationHistory` — return a bounded suffix of the transcript.

use async_trait::async_trait;
use serde_json::{Value, json};
use sitara_core::error::ToolError;
use sitara_core::tool::Tool;
use sitara_core::transcript::SharedTranscript;

/// Serves the last `recent_max` turns of the rolling transcript.
///
/// The bound keeps tool results small no matter how long the session has
/// been running.
pub struct ConversationHistoryTool {
    transcript: SharedTranscript,
    recent_max: usize,
}

impl ConversationHistoryTool {
    pub fn new(transcript: SharedTranscript, recent_max: usize) -> Self {
        Self {
            transcript,
            recent_max,
        }
    }
}

#[async_trait]
impl Tool for ConversationHistoryTool {
    fn name(&self) -> &str {
        "getConversationHistory"
    }

    fn description(&self) -> &str {
        "Returns the most recent turns of the current conversation"
    }

    async fn invoke(&self, _arguments: Value) -> Result<Value, ToolError> {
        let recent = self.transcript.recent(self.recent_max).await;
        Ok(json!({ "messages": recent }))
    }
}

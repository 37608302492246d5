//! `getMemoryBuffer` — return the current stringified memory snapshot.

use async_trait::async_trait;
use serde_json::Value;
use sitara_context::ContextStore;
use sitara_core::error::ToolError;
use sitara_core::tool::Tool;
use tracing::debug;

/// Reads the memory snapshot fresh on every call so the agent always sees
/// the latest known facts, not the session-start state.
pub struct MemoryBufferTool {
    store: ContextStore,
}

impl MemoryBufferTool {
    pub fn new(store: ContextStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MemoryBufferTool {
    fn name(&self) -> &str {
        "getMemoryBuffer"
    }

    fn description(&self) -> &str {
        "Returns the current structured memory snapshot as a string map"
    }

    async fn invoke(&self, _arguments: Value) -> Result<Value, ToolError> {
        let snapshot = self
            .store
            .read_snapshot()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "getMemoryBuffer".into(),
                reason: e.to_string(),
            })?;

        let vars = snapshot.stringify();
        debug!(keys = vars.len(), "Serving memory buffer to tool call");
        serde_json::to_value(vars).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "getMemoryBuffer".into(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn returns_stringified_snapshot() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"focus": "career", "pinned_facts": ["saturn return"], "gap": null}}"#
        )
        .unwrap();

        let tool = MemoryBufferTool::new(ContextStore::new(tmp.path()));
        let result = tool.invoke(Value::Null).await.unwrap();

        assert_eq!(result["focus"], "career");
        assert_eq!(result["pinned_facts"], json!(r#"["saturn return"]"#));
        assert_eq!(result["gap"], "");
    }

    #[tokio::test]
    async fn missing_snapshot_returns_empty_map() {
        let tool = MemoryBufferTool::new(ContextStore::new(
            "/tmp/sitara_test_missing_memory_tool.json",
        ));
        let result = tool.invoke(Value::Null).await.unwrap();
        assert_eq!(result, json!({}));
    }

    #[tokio::test]
    async fn malformed_snapshot_is_a_tool_error() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "not json").unwrap();

        let tool = MemoryBufferTool::new(ContextStore::new(tmp.path()));
        let err = tool.invoke(Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}

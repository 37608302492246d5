//! Error types for the Sitara domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error enum; the split encodes the recovery policy: store
//! failures are transient ("no new data this tick"), tool failures are
//! local to one call, transport failures end the session attempt.

use thiserror::Error;

/// The top-level error type for all Sitara operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Context store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Session transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures reading the local context sources (snapshot file, update queue).
///
/// Always transient from the synchronizer's point of view: the poll loop
/// logs the failure, treats it as "no new data since last success", and
/// keeps running. A store failure must never end the session.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable at {path}: {reason}")]
    Unavailable { path: String, reason: String },

    #[error("Store content malformed at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Failures on the session connection itself.
///
/// These are fatal to the current session attempt. There is no built-in
/// retry; the caller decides whether to start over.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Session lost: {0}")]
    SessionLost(String),

    #[error("Missing agent_id (set it in config or SITARA_AGENT_ID)")]
    MissingAgentId,

    #[error("Missing API key (set SITARA_API_KEY or api_key in config)")]
    MissingApiKey,

    #[error("Signed URL acquisition failed: {0}")]
    SignedUrl(String),
}

/// Failures handling a single client tool call.
///
/// Converted by the transport into an error-flagged tool result; one
/// failed tool call never terminates the session.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unsupported tool: {0}")]
    Unsupported(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_displays_path_and_reason() {
        let err = Error::Store(StoreError::Unavailable {
            path: "buffer/memory_buffer.json".into(),
            reason: "permission denied".into(),
        });
        assert!(err.to_string().contains("memory_buffer.json"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn unsupported_tool_displays_name() {
        let err = Error::Tool(ToolError::Unsupported("castHoroscope".into()));
        assert!(err.to_string().contains("castHoroscope"));
    }

    #[test]
    fn session_lost_displays_reason() {
        let err = TransportError::SessionLost("connection reset".into());
        assert!(err.to_string().contains("connection reset"));
    }
}

//! Wire protocol for the remote conversational-agent websocket.
//!
//! Event kinds are discriminated by a `type` field; inbound payloads nest
//! their data under per-kind `*_event` objects. Unknown inbound kinds fail
//! to parse and are skipped by the receive loop.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sitara_core::snapshot::StringMap;

/// Message from the remote agent platform to this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Liveness probe; must be answered with a `pong` echoing the id.
    Ping { ping_event: PingEvent },

    /// Initiation acknowledgment carrying the assigned session id.
    ConversationInitiationMetadata {
        conversation_initiation_metadata_event: InitiationMetadata,
    },

    /// Transcribed user speech.
    UserTranscript {
        user_transcription_event: UserTranscription,
    },

    /// Agent reply text.
    AgentResponse {
        agent_response_event: AgentResponseEvent,
    },

    /// Audio chunk; playback is the frontend's concern, ignored here.
    Audio,

    /// The user interrupted the agent mid-reply; ignored here.
    Interruption,

    /// The agent asks this client to run a tool and return its result.
    ClientToolCall { client_tool_call: ToolCallRequest },
}

/// Payload of a `ping` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingEvent {
    /// Echoed verbatim in the pong; numeric on the wire today, but kept
    /// as a raw value so a format change cannot break liveness.
    pub event_id: Value,
}

/// Payload of a `conversation_initiation_metadata` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiationMetadata {
    pub conversation_id: String,
}

/// Payload of a `user_transcript` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTranscription {
    #[serde(default)]
    pub user_transcript: String,
}

/// Payload of an `agent_response` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponseEvent {
    #[serde(default)]
    pub agent_response: String,
}

/// Payload of a `client_tool_call` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    pub tool_call_id: String,
    #[serde(default)]
    pub parameters: Value,
}

/// Message from this client to the remote agent platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// First message after connect: session personalization.
    ConversationInitiationClientData {
        conversation_config_override: ConversationConfigOverride,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_llm_extra_body: Option<HashMap<String, Value>>,
        dynamic_variables: StringMap,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },

    /// Liveness reply; echoes the ping's event id.
    Pong { event_id: Value },

    /// Non-interrupting mid-session context refresh.
    ContextualUpdate {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
    },

    /// Result of a client tool call; exactly one per invocation.
    ClientToolResult {
        tool_call_id: String,
        result: Value,
        is_error: bool,
    },
}

/// Per-session configuration overrides in the initiation payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfigOverride {
    pub agent: AgentOverride,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsOverride>,
}

/// Agent-level overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
}

/// System-prompt override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptOverride {
    pub prompt: String,
}

/// Text-to-speech overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TtsOverride {
    pub voice_id: String,
}

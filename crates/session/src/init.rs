//! Initiation payload assembly.
//!
//! Builds the `conversation_initiation_client_data` message from config,
//! the rendered prompt, and the stringified context. Every optional
//! override is gated by its explicit enable flag; nothing is sent by
//! accident.

use sitara_config::AppConfig;
use sitara_core::snapshot::StringMap;
use sitara_transport::protocol::{
    AgentOverride, ConversationConfigOverride, OutboundEvent, PromptOverride, TtsOverride,
};

/// Assemble the initiation payload.
///
/// `system_prompt` is the already-rendered prompt text; `None` (or empty)
/// means no prompt override is sent. Dynamic variables always go out so
/// the agent's own templating keeps working even without an override.
pub fn build_initiation_payload(
    config: &AppConfig,
    system_prompt: Option<String>,
    dynamic_variables: StringMap,
) -> OutboundEvent {
    let prompt = system_prompt
        .filter(|p| !p.is_empty())
        .map(|prompt| PromptOverride { prompt });

    let agent = AgentOverride {
        prompt,
        language: config.overrides.language().map(str::to_string),
        first_message: config.overrides.first_message().map(str::to_string),
    };

    let tts = config.overrides.voice_id().map(|voice_id| TtsOverride {
        voice_id: voice_id.to_string(),
    });

    OutboundEvent::ConversationInitiationClientData {
        conversation_config_override: ConversationConfigOverride { agent, tts },
        custom_llm_extra_body: config.overrides.extra_body.clone(),
        dynamic_variables,
        user_id: config.user_id.clone(),
    }
}

//! Configuration loading, validation, and management for Sitara.
//!
//! Loads configuration from `~/.sitara/config.toml` with environment
//! variable overrides for credentials and session identity. Validates all
//! settings at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The root configuration structure.
///
/// Maps directly to `~/.sitara/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the remote agent platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Public agent id; ignored when a signed URL is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Pre-authenticated WSS URL (for private agents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_url: Option<String>,

    /// How to authenticate the websocket connection
    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Optional end-user identifier forwarded in the initiation payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Whether to override the agent's system prompt each session
    #[serde(default = "default_true")]
    pub prompt_override: bool,

    /// Path to the prompt template with `{{placeholder}}` tokens
    #[serde(default = "default_template_path")]
    pub prompt_template_path: PathBuf,

    /// Remote endpoint configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Per-session overrides for the initiation payload
    #[serde(default)]
    pub overrides: SessionOverrides,

    /// Context source watching configuration
    #[serde(default)]
    pub watch: WatchConfig,

    /// Transcript handling configuration
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

fn default_true() -> bool {
    true
}
fn default_template_path() -> PathBuf {
    PathBuf::from("responder.md")
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("agent_id", &self.agent_id)
            .field("signed_url", &redact(&self.signed_url))
            .field("auth_mode", &self.auth_mode)
            .field("user_id", &self.user_id)
            .field("prompt_override", &self.prompt_override)
            .field("prompt_template_path", &self.prompt_template_path)
            .field("endpoint", &self.endpoint)
            .field("overrides", &self.overrides)
            .field("watch", &self.watch)
            .field("transcript", &self.transcript)
            .finish()
    }
}

/// Websocket authentication mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Use the configured signed URL if present, else fetch one with the
    /// API key (required)
    #[default]
    Auto,
    /// Connect with the bare agent id (public agents only)
    Public,
}

/// Remote agent platform endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base websocket endpoint for conversations
    #[serde(default = "default_wss_base")]
    pub wss_base_url: String,

    /// HTTPS endpoint that exchanges an agent id for a signed URL
    #[serde(default = "default_signed_url_endpoint")]
    pub signed_url_endpoint: String,
}

fn default_wss_base() -> String {
    "wss://api.elevenlabs.io/v1/convai/conversation".into()
}
fn default_signed_url_endpoint() -> String {
    "https://api.elevenlabs.io/v1/convai/conversation/get_signed_url".into()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            wss_base_url: default_wss_base(),
            signed_url_endpoint: default_signed_url_endpoint(),
        }
    }
}

/// Optional per-session overrides for the initiation payload.
///
/// Every override field has an explicit enable flag: a value is only sent
/// when its flag is set AND the value is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionOverrides {
    /// Send `agent.language` in the initiation payload
    #[serde(default)]
    pub override_language: bool,

    /// Agent language code (e.g. "en")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Send `agent.first_message` in the initiation payload
    #[serde(default)]
    pub override_first_message: bool,

    /// Opening line the agent speaks first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,

    /// Send `tts.voice_id` in the initiation payload
    #[serde(default)]
    pub override_voice: bool,

    /// TTS voice identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,

    /// Free-form LLM knobs passed through verbatim (temperature, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_body: Option<HashMap<String, serde_json::Value>>,
}

impl SessionOverrides {
    /// Language to send, gated by its enable flag.
    pub fn language(&self) -> Option<&str> {
        if self.override_language {
            self.language.as_deref()
        } else {
            None
        }
    }

    /// First message to send, gated by its enable flag.
    pub fn first_message(&self) -> Option<&str> {
        if self.override_first_message {
            self.first_message.as_deref()
        } else {
            None
        }
    }

    /// Voice id to send, gated by its enable flag.
    pub fn voice_id(&self) -> Option<&str> {
        if self.override_voice {
            self.voice_id.as_deref()
        } else {
            None
        }
    }
}

/// Context source watching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Poll interval in milliseconds. A responsiveness/overhead trade-off,
    /// not a correctness parameter.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Watch the memory snapshot and push diffs as contextual updates
    #[serde(default = "default_true")]
    pub send_contextual_updates: bool,

    /// Watch the append-only update queue
    #[serde(default = "default_true")]
    pub enable_updates_queue: bool,

    /// Path of the structured memory snapshot (JSON object)
    #[serde(default = "default_memory_buffer_path")]
    pub memory_buffer_path: PathBuf,

    /// Path of the append-only update queue (NDJSON)
    #[serde(default = "default_updates_queue_path")]
    pub updates_queue_path: PathBuf,
}

fn default_interval_ms() -> u64 {
    1500
}
fn default_memory_buffer_path() -> PathBuf {
    PathBuf::from("buffer/memory_buffer.json")
}
fn default_updates_queue_path() -> PathBuf {
    PathBuf::from("buffer/updates.ndjson")
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            send_contextual_updates: true,
            enable_updates_queue: true,
            memory_buffer_path: default_memory_buffer_path(),
            updates_queue_path: default_updates_queue_path(),
        }
    }
}

/// Transcript handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Append `U:`/`A:` lines here as turns arrive (best-effort)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// How many trailing turns the history tool returns
    #[serde(default = "default_recent_max")]
    pub recent_max: usize,
}

fn default_recent_max() -> usize {
    10
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            recent_max: default_recent_max(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (`~/.sitara/config.toml`).
    ///
    /// Environment variables take precedence over file values:
    /// - `SITARA_API_KEY` (or `ELEVENLABS_API_KEY`)
    /// - `SITARA_AGENT_ID`, `SITARA_SIGNED_URL`, `SITARA_USER_ID`
    /// - `SITARA_VOICE_ID`, `SITARA_LANGUAGE`, `SITARA_AUTH_MODE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(key) = std::env::var("SITARA_API_KEY") {
            config.api_key = Some(key);
        } else if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(agent_id) = std::env::var("SITARA_AGENT_ID") {
            config.agent_id = Some(agent_id);
        }
        if let Ok(url) = std::env::var("SITARA_SIGNED_URL") {
            config.signed_url = Some(url);
        }
        if let Ok(user_id) = std::env::var("SITARA_USER_ID") {
            config.user_id = Some(user_id);
        }
        if let Ok(voice) = std::env::var("SITARA_VOICE_ID") {
            config.overrides.voice_id = Some(voice);
        }
        if let Ok(language) = std::env::var("SITARA_LANGUAGE") {
            config.overrides.language = Some(language);
        }
        if let Ok(mode) = std::env::var("SITARA_AUTH_MODE") {
            config.auth_mode = match mode.to_lowercase().as_str() {
                "public" => AuthMode::Public,
                _ => AuthMode::Auto,
            };
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sitara")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.watch.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "watch.interval_ms must be greater than 0".into(),
            ));
        }

        if self.transcript.recent_max == 0 {
            return Err(ConfigError::ValidationError(
                "transcript.recent_max must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            agent_id: None,
            signed_url: None,
            auth_mode: AuthMode::default(),
            user_id: None,
            prompt_override: true,
            prompt_template_path: default_template_path(),
            endpoint: EndpointConfig::default(),
            overrides: SessionOverrides::default(),
            watch: WatchConfig::default(),
            transcript: TranscriptConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

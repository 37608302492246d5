//! Connection URL resolution.
//!
//! Three ways to reach the websocket endpoint, in priority order: a
//! pre-authenticated signed URL from config, a bare agent id for public
//! agents, or a signed URL fetched over HTTPS with the API key.

use std::time::Duration;

use serde::Deserialize;
use sitara_config::{AppConfig, AuthMode};
use sitara_core::error::TransportError;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(default)]
    signed_url: Option<String>,
}

/// Resolve the websocket URL for the configured agent.
///
/// Does not open the connection; failures here are credential or
/// acquisition problems, reported as [`TransportError`].
pub async fn resolve_connection_url(config: &AppConfig) -> Result<String, TransportError> {
    if let Some(signed) = config.signed_url.as_deref() {
        let signed = signed.trim();
        if !signed.is_empty() {
            return Ok(signed.to_string());
        }
    }

    let agent_id = config
        .agent_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(TransportError::MissingAgentId)?;

    if config.auth_mode == AuthMode::Public {
        if config.has_api_key() {
            warn!("auth_mode=public ignores the API key; connecting as a public agent");
        }
        return Ok(format!(
            "{}?agent_id={agent_id}",
            config.endpoint.wss_base_url
        ));
    }

    let api_key = config
        .api_key
        .as_deref()
        .ok_or(TransportError::MissingApiKey)?;

    fetch_signed_url(&config.endpoint.signed_url_endpoint, agent_id, api_key).await
}

/// Exchange an agent id for a short-lived signed websocket URL.
async fn fetch_signed_url(
    endpoint: &str,
    agent_id: &str,
    api_key: &str,
) -> Result<String, TransportError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| TransportError::SignedUrl(e.to_string()))?;

    let response = client
        .get(endpoint)
        .query(&[("agent_id", agent_id)])
        .header("xi-api-key", api_key)
        .send()
        .await
        .map_err(|e| TransportError::SignedUrl(e.to_string()))?
        .error_for_status()
        .map_err(|e| TransportError::SignedUrl(e.to_string()))?;

    let body: SignedUrlResponse = response
        .json()
        .await
        .map_err(|e| TransportError::SignedUrl(e.to_string()))?;

    match body.signed_url.filter(|url| !url.is_empty()) {
        Some(url) => {
            info!("Obtained signed URL for conversation");
            Ok(url)
        }
        None => Err(TransportError::SignedUrl(
            "signed_url missing in response".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(
        signed_url: Option<&str>,
        agent_id: Option<&str>,
        api_key: Option<&str>,
        auth_mode: AuthMode,
    ) -> AppConfig {
        AppConfig {
            signed_url: signed_url.map(str::to_string),
            agent_id: agent_id.map(str::to_string),
            api_key: api_key.map(str::to_string),
            auth_mode,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn configured_signed_url_wins() {
        let config = config_with(
            Some("wss://signed.example/abc"),
            Some("agent_1"),
            Some("key"),
            AuthMode::Auto,
        );
        let url = resolve_connection_url(&config).await.unwrap();
        assert_eq!(url, "wss://signed.example/abc");
    }

    #[tokio::test]
    async fn public_mode_builds_agent_url() {
        let config = config_with(None, Some("agent_1"), None, AuthMode::Public);
        let url = resolve_connection_url(&config).await.unwrap();
        assert!(url.ends_with("?agent_id=agent_1"));
        assert!(url.starts_with("wss://"));
    }

    #[tokio::test]
    async fn missing_agent_id_is_an_error() {
        let config = config_with(None, None, Some("key"), AuthMode::Auto);
        let err = resolve_connection_url(&config).await.unwrap_err();
        assert!(matches!(err, TransportError::MissingAgentId));
    }

    #[tokio::test]
    async fn auto_mode_without_api_key_is_an_error() {
        let config = config_with(None, Some("agent_1"), None, AuthMode::Auto);
        let err = resolve_connection_url(&config).await.unwrap_err();
        assert!(matches!(err, TransportError::MissingApiKey));
    }

    #[tokio::test]
    async fn blank_signed_url_falls_through() {
        let config = config_with(Some("   "), Some("agent_1"), None, AuthMode::Public);
        let url = resolve_connection_url(&config).await.unwrap();
        assert!(url.contains("agent_id=agent_1"));
    }
}

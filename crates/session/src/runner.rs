//! The session runner — composition root for one live session.
//!
//! Resolves the connection URL, builds the initiation payload from the
//! current context, connects, and then drives three concurrent activities
//! over the one connection: the transport's receive loop, the context
//! synchronizer's periodic tick, and the observer that mirrors turns to
//! the console and the transcript log. An interrupt signal closes the
//! session in an orderly fashion before exit.

use std::sync::Arc;
use std::time::Duration;

use sitara_config::AppConfig;
use sitara_context::{ContextStore, UpdateQueue, render};
use sitara_core::error::{Error, Result};
use sitara_core::event::{EventBus, SessionEvent};
use sitara_core::session::SharedSessionHandle;
use sitara_core::snapshot::StringMap;
use sitara_core::transcript::{Role, SharedTranscript};
use sitara_transport::protocol::OutboundEvent;
use sitara_transport::{SessionTransport, resolve_connection_url};
use tracing::{info, warn};

use crate::init::build_initiation_payload;
use crate::sync::ContextSynchronizer;
use crate::transcript_log::TranscriptLogger;

/// Orchestrates one session from connect to close.
pub struct SessionRunner {
    config: AppConfig,
}

impl SessionRunner {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    fn store(&self) -> ContextStore {
        ContextStore::new(&self.config.watch.memory_buffer_path)
    }

    fn queue(&self) -> UpdateQueue {
        UpdateQueue::new(&self.config.watch.updates_queue_path)
    }

    /// Build the initiation payload from the current context.
    ///
    /// Also returns the stringified context so the synchronizer can seed
    /// its diff baseline with the exact session-start state.
    pub fn build_initiation(&self) -> Result<(OutboundEvent, StringMap)> {
        let snapshot = self.store().read_snapshot()?;
        let vars = snapshot.stringify();

        let prompt = if self.config.prompt_override {
            match std::fs::read_to_string(&self.config.prompt_template_path) {
                Ok(template) => Some(render(&template, &vars)),
                Err(e) => {
                    warn!(
                        path = %self.config.prompt_template_path.display(),
                        error = %e,
                        "Prompt template unavailable; sending no prompt override"
                    );
                    None
                }
            }
        } else {
            None
        };

        let payload = build_initiation_payload(&self.config, prompt, vars.clone());
        Ok((payload, vars))
    }

    /// Run one session to completion.
    pub async fn run(&self) -> Result<()> {
        let url = resolve_connection_url(&self.config).await?;
        let (payload, initial_vars) = self.build_initiation()?;

        let handle = SharedSessionHandle::new();
        let transcript = SharedTranscript::new();
        let events = Arc::new(EventBus::default());
        let tools = Arc::new(sitara_tools::default_registry(
            self.store(),
            transcript.clone(),
            self.config.transcript.recent_max,
        ));

        let (transport, inbound) = SessionTransport::connect(
            &url,
            handle,
            transcript,
            tools,
            Arc::clone(&events),
        )
        .await?;
        let transport = Arc::new(transport);

        transport.send_initiation(&payload).await?;

        let observer = Self::spawn_observer(
            Arc::clone(&events),
            TranscriptLogger::new(self.config.transcript.log_path.clone()),
        );
        let synchronizer = self.spawn_synchronizer(Arc::clone(&transport), initial_vars);

        let result = tokio::select! {
            res = transport.run(inbound) => res.map_err(Error::from),
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received; closing session");
                transport.close().await.map_err(Error::from)
            }
        };

        if let Some(task) = synchronizer {
            task.abort();
        }
        observer.abort();
        result
    }

    /// Mirror session events to the console and the transcript log.
    fn spawn_observer(
        events: Arc<EventBus>,
        logger: TranscriptLogger,
    ) -> tokio::task::JoinHandle<()> {
        let mut rx = events.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                match event.as_ref() {
                    SessionEvent::SessionReady { conversation_id } => {
                        info!(conversation_id = %conversation_id, "Conversation ready");
                    }
                    SessionEvent::Turn { role, text } => {
                        match role {
                            Role::User => println!("[user] {text}"),
                            Role::Agent => println!("[agent] {text}"),
                        }
                        logger.append(*role, text);
                    }
                    SessionEvent::SessionClosed { reason } => {
                        if let Some(reason) = reason {
                            warn!(reason = %reason, "Session closed");
                        }
                        break;
                    }
                }
            }
        })
    }

    /// Start the periodic context synchronizer, if any source is enabled.
    fn spawn_synchronizer(
        &self,
        transport: Arc<SessionTransport>,
        initial_vars: StringMap,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let watch = &self.config.watch;
        if !watch.send_contextual_updates && !watch.enable_updates_queue {
            return None;
        }

        let sync = ContextSynchronizer::new(
            self.store(),
            self.queue(),
            Duration::from_millis(watch.interval_ms),
            initial_vars,
        )
        .with_snapshot_watch(watch.send_contextual_updates)
        .with_queue_watch(watch.enable_updates_queue);

        Some(tokio::spawn(async move {
            sync.run(&transport).await;
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_in(dir: &tempfile::TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.watch.memory_buffer_path = dir.path().join("memory_buffer.json");
        config.watch.updates_queue_path = dir.path().join("updates.ndjson");
        config.prompt_template_path = dir.path().join("responder.md");
        config
    }

    #[test]
    fn build_initiation_renders_prompt_from_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.user_id = Some("user_1".into());

        std::fs::File::create(&config.watch.memory_buffer_path)
            .unwrap()
            .write_all(br#"{"name": "Mira", "focus": "career"}"#)
            .unwrap();
        std::fs::File::create(&config.prompt_template_path)
            .unwrap()
            .write_all(b"Guide {{name}} on {{focus}}. {{missing}} Done.")
            .unwrap();

        let runner = SessionRunner::new(config);
        let (payload, vars) = runner.build_initiation().unwrap();

        assert_eq!(vars["name"], "Mira");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value["conversation_config_override"]["agent"]["prompt"]["prompt"],
            "Guide Mira on career.  Done."
        );
        assert_eq!(value["dynamic_variables"]["focus"], "career");
        assert_eq!(value["user_id"], "user_1");
    }

    #[test]
    fn prompt_override_disabled_sends_no_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.prompt_override = false;

        let runner = SessionRunner::new(config);
        let (payload, _) = runner.build_initiation().unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert!(
            value["conversation_config_override"]["agent"]
                .get("prompt")
                .is_none()
        );
    }

    #[test]
    fn missing_template_degrades_to_no_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let runner = SessionRunner::new(config);
        let (payload, _) = runner.build_initiation().unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert!(
            value["conversation_config_override"]["agent"]
                .get("prompt")
                .is_none()
        );
    }

    #[test]
    fn missing_snapshot_yields_empty_variables() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SessionRunner::new(config_in(&dir));
        let (_, vars) = runner.build_initiation().unwrap();
        assert!(vars.is_empty());
    }
}

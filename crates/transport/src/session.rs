//! The session transport: one live websocket, one writer, one reader.
//!
//! The receive loop is the sole reader of inbound frames and owns every
//! [`SessionState`] transition. Outbound frames — pongs, tool results,
//! contextual updates, the initiation payload — all pass through a single
//! sink whose writer sits behind a mutex, so concurrent senders can never
//! interleave partial messages.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use sitara_core::error::TransportError;
use sitara_core::event::{EventBus, SessionEvent};
use sitara_core::session::{SessionState, SharedSessionHandle};
use sitara_core::tool::ToolRegistry;
use sitara_core::transcript::{Role, SharedTranscript, Turn};
use sitara_core::update::PendingUpdate;

use crate::protocol::{InboundEvent, OutboundEvent};

/// The underlying websocket stream type.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The inbound half handed to [`SessionTransport::run`].
pub type InboundStream = SplitStream<WsStream>;

/// Serialized access to the outbound half of the connection.
///
/// The trait is the transport's test seam: production uses [`WsSink`],
/// tests substitute a recording implementation.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    /// Serialize and send one event. Implementations must not interleave
    /// concurrent sends.
    async fn send(&self, event: &OutboundEvent) -> Result<(), TransportError>;

    /// Send a close frame and shut the outbound half down.
    async fn shutdown(&self) -> Result<(), TransportError>;
}

/// Production sink over the split websocket writer.
pub struct WsSink {
    writer: Mutex<SplitSink<WsStream, Message>>,
}

#[async_trait]
impl OutboundSink for WsSink {
    async fn send(&self, event: &OutboundEvent) -> Result<(), TransportError> {
        let json =
            serde_json::to_string(event).map_err(|e| TransportError::SendFailed(e.to_string()))?;
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        let _ = writer.send(Message::Close(None)).await;
        let _ = writer.close().await;
        Ok(())
    }
}

/// Manages the one active remote conversation.
pub struct SessionTransport {
    sink: Arc<dyn OutboundSink>,
    handle: SharedSessionHandle,
    transcript: SharedTranscript,
    tools: Arc<ToolRegistry>,
    events: Arc<EventBus>,
}

impl SessionTransport {
    /// Assemble a transport over an already-established sink.
    pub fn new(
        sink: Arc<dyn OutboundSink>,
        handle: SharedSessionHandle,
        transcript: SharedTranscript,
        tools: Arc<ToolRegistry>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            sink,
            handle,
            transcript,
            tools,
            events,
        }
    }

    /// Open the websocket connection. Single attempt, no built-in retry.
    ///
    /// On success the session is in `Connecting`; the caller must send the
    /// initiation payload before anything else.
    pub async fn connect(
        url: &str,
        handle: SharedSessionHandle,
        transcript: SharedTranscript,
        tools: Arc<ToolRegistry>,
        events: Arc<EventBus>,
    ) -> Result<(Self, InboundStream), TransportError> {
        handle.set_state(SessionState::Connecting).await;

        let (stream, _response) = match connect_async(url).await {
            Ok(ok) => ok,
            Err(e) => {
                handle.set_state(SessionState::Disconnected).await;
                return Err(TransportError::ConnectFailed(e.to_string()));
            }
        };
        info!("WebSocket connection established");

        let (writer, reader) = stream.split();
        let sink = Arc::new(WsSink {
            writer: Mutex::new(writer),
        });

        Ok((Self::new(sink, handle, transcript, tools, events), reader))
    }

    pub fn handle(&self) -> &SharedSessionHandle {
        &self.handle
    }

    /// Send the initiation payload. Must be the first message after
    /// `connect`; transitions `Connecting → Initiating`.
    pub async fn send_initiation(&self, payload: &OutboundEvent) -> Result<(), TransportError> {
        let state = self.handle.state().await;
        if state != SessionState::Connecting {
            return Err(TransportError::SendFailed(format!(
                "initiation payload sent in state {state}"
            )));
        }
        self.sink.send(payload).await?;
        self.handle.set_state(SessionState::Initiating).await;
        info!("Sent conversation initiation payload");
        Ok(())
    }

    /// Push a non-interrupting contextual update into the active session.
    ///
    /// Updates are best-effort: outside the `Active` state this is
    /// silently a no-op, since the target session id is unknown or gone.
    pub async fn send_contextual_update(
        &self,
        update: &PendingUpdate,
    ) -> Result<(), TransportError> {
        let session = self.handle.snapshot().await;
        if !session.is_active() {
            debug!(state = %session.state(), "Dropping contextual update outside active session");
            return Ok(());
        }

        let event = OutboundEvent::ContextualUpdate {
            text: update.text.clone(),
            conversation_id: session.conversation_id().map(str::to_string),
        };
        self.sink.send(&event).await
    }

    /// Drive the receive loop until the connection ends.
    ///
    /// Returns `Ok(())` on orderly closure (ours or the remote's) and
    /// [`TransportError::SessionLost`] on an unexpected failure. Either
    /// way the session handle ends up `Closed` and no further sends are
    /// issued by this transport.
    pub async fn run(&self, mut inbound: InboundStream) -> Result<(), TransportError> {
        while let Some(next) = inbound.next().await {
            let text = match next {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(frame)) => {
                    info!(?frame, "WebSocket closed by remote");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    self.handle.close().await;
                    self.events.publish(SessionEvent::SessionClosed {
                        reason: Some(e.to_string()),
                    });
                    return Err(TransportError::SessionLost(e.to_string()));
                }
            };

            let event = match serde_json::from_str::<InboundEvent>(&text) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "Ignoring unrecognized inbound event");
                    continue;
                }
            };

            if let Err(e) = self.handle_event(event).await {
                // A failed send means the connection is going away
                error!(error = %e, "Outbound send failed; ending session");
                self.handle.close().await;
                self.events.publish(SessionEvent::SessionClosed {
                    reason: Some(e.to_string()),
                });
                return Err(TransportError::SessionLost(e.to_string()));
            }
        }

        let was_closing = self.handle.state().await == SessionState::Closing;
        self.handle.close().await;
        self.events
            .publish(SessionEvent::SessionClosed { reason: None });
        if !was_closing {
            info!("Session ended by remote side");
        }
        Ok(())
    }

    /// Dispatch one inbound event.
    ///
    /// A ping is answered before anything else can produce outbound
    /// traffic in the same iteration. A tool call yields exactly one
    /// result message — error-flagged when the tool is unknown or fails.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), TransportError> {
        match event {
            InboundEvent::Ping { ping_event } => {
                self.sink
                    .send(&OutboundEvent::Pong {
                        event_id: ping_event.event_id,
                    })
                    .await?;
            }

            InboundEvent::ConversationInitiationMetadata {
                conversation_initiation_metadata_event: metadata,
            } => {
                info!(conversation_id = %metadata.conversation_id, "Conversation ready");
                self.handle.activate(&metadata.conversation_id).await;
                self.events.publish(SessionEvent::SessionReady {
                    conversation_id: metadata.conversation_id,
                });
            }

            InboundEvent::UserTranscript {
                user_transcription_event: event,
            } => {
                if !event.user_transcript.is_empty() {
                    self.transcript
                        .push(Turn::user(&event.user_transcript))
                        .await;
                    self.events.publish(SessionEvent::Turn {
                        role: Role::User,
                        text: event.user_transcript,
                    });
                }
            }

            InboundEvent::AgentResponse {
                agent_response_event: event,
            } => {
                if !event.agent_response.is_empty() {
                    self.transcript.push(Turn::agent(&event.agent_response)).await;
                    self.events.publish(SessionEvent::Turn {
                        role: Role::Agent,
                        text: event.agent_response,
                    });
                }
            }

            InboundEvent::Audio | InboundEvent::Interruption => {}

            InboundEvent::ClientToolCall { client_tool_call } => {
                let result = match self
                    .tools
                    .handle(&client_tool_call.tool_name, client_tool_call.parameters)
                    .await
                {
                    Ok(value) => OutboundEvent::ClientToolResult {
                        tool_call_id: client_tool_call.tool_call_id,
                        result: value,
                        is_error: false,
                    },
                    Err(e) => {
                        warn!(
                            tool = %client_tool_call.tool_name,
                            error = %e,
                            "Tool call failed"
                        );
                        OutboundEvent::ClientToolResult {
                            tool_call_id: client_tool_call.tool_call_id,
                            result: Value::String(e.to_string()),
                            is_error: true,
                        }
                    }
                };
                self.sink.send(&result).await?;
            }
        }

        Ok(())
    }

    /// Close the connection from our side. Idempotent.
    pub async fn close(&self) -> Result<(), TransportError> {
        if self.handle.state().await == SessionState::Closed {
            return Ok(());
        }
        self.handle.set_state(SessionState::Closing).await;
        self.sink.shutdown().await?;
        self.handle.close().await;
        info!("Session closed");
        Ok(())
    }
}

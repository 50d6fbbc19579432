use super::channel::{Channel, ChannelEvent};
use super::wire::{ClientMessage, ServerMessage};
use crate::error::{ChannelError, ErrorKind};
use crate::events::{AudioEvent, ClientEvent, ErrorEvent, EventDispatcher, SettingsEvent, TextEvent};
use crate::session::{PersonaMode, SessionStatus, SharedSession};
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, warn};

/// Translation between the wire and the domain: handshake on link-up,
/// inbound frames to session mutations and typed events, outbound requests
/// to wire messages.
pub struct Connection {
    channel: Arc<dyn Channel>,
    session: Arc<SharedSession>,
    dispatcher: Arc<EventDispatcher>,
}

impl Connection {
    pub fn new(
        channel: Arc<dyn Channel>,
        session: Arc<SharedSession>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            channel,
            session,
            dispatcher,
        }
    }

    /// Whether the session currently has a usable link.
    pub fn is_connected(&self) -> bool {
        self.session.status().is_connected()
    }

    /// React to one transport event.
    pub async fn handle_event(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Up => self.on_up().await,
            ChannelEvent::Down => {
                if self.session.set_status(SessionStatus::Disconnected) {
                    self.dispatcher.emit(ClientEvent::Disconnected);
                }
            }
            ChannelEvent::Message(frame) => self.handle_frame(frame),
            ChannelEvent::Failed(message) => {
                self.session.set_status(SessionStatus::Disconnected);
                self.dispatcher.emit(ClientEvent::Error(ErrorEvent {
                    kind: ErrorKind::Connection,
                    code: None,
                    message,
                }));
            }
        }
    }

    /// Handshake first, then the status edge, then the connected
    /// notification.
    async fn on_up(&self) {
        let handshake = ClientMessage::Handshake {
            role: self.session.role(),
            device_id: self.session.device_id(),
        };
        if let Err(err) = self.send(&handshake).await {
            warn!("handshake send failed: {}", err);
        }
        self.session.set_status(SessionStatus::Idle);
        self.dispatcher.emit(ClientEvent::Connected);
    }

    /// Map one inbound frame to session mutations and domain events.
    /// Unrecognized types and status values are ignored.
    pub fn handle_frame(&self, frame: serde_json::Value) {
        let message: ServerMessage = match serde_json::from_value(frame) {
            Ok(message) => message,
            Err(err) => {
                debug!("ignoring unrecognized frame: {}", err);
                return;
            }
        };

        match message {
            ServerMessage::Status { status } => match status.as_str() {
                "thinking" => {
                    self.session.set_status(SessionStatus::Thinking);
                }
                "idle" => {
                    self.session.set_status(SessionStatus::Idle);
                }
                other => debug!("ignoring unknown status value {:?}", other),
            },

            ServerMessage::SetSettings {
                mode,
                vad_sensitivity,
                vad_auto_calibrate,
                vad_timeout,
            } => {
                let settings = SettingsEvent {
                    mode,
                    vad_sensitivity,
                    vad_auto_calibrate,
                    vad_timeout_ms: vad_timeout,
                };
                self.session.apply_settings(&settings);
                self.dispatcher.emit(ClientEvent::Settings(settings));
            }

            ServerMessage::LiveText {
                role,
                text,
                is_final,
                user_text,
                is_filler,
            } => {
                if role != "ai" {
                    debug!("ignoring live_text for role {:?}", role);
                    return;
                }
                self.dispatcher.emit(ClientEvent::Text(TextEvent {
                    user_text,
                    ai_text: text,
                    is_final,
                    is_filler: is_filler.unwrap_or(false),
                }));
            }

            ServerMessage::AudioOutput {
                text,
                priority,
                user_text,
                is_intercom,
                is_filler,
            } => {
                self.dispatcher.emit(ClientEvent::Audio(AudioEvent {
                    text,
                    priority,
                    user_text,
                    is_intercom: is_intercom.unwrap_or(false),
                    is_filler: is_filler.unwrap_or(false),
                }));
            }

            ServerMessage::Error { message } => {
                // Backend-reported; status is left as it is.
                self.dispatcher.emit(ClientEvent::Error(ErrorEvent {
                    kind: ErrorKind::Server,
                    code: None,
                    message,
                }));
            }

            ServerMessage::AuthError { code, message } => {
                self.session.set_status(SessionStatus::Disconnected);
                self.dispatcher.emit(ClientEvent::Error(ErrorEvent {
                    kind: ErrorKind::Auth,
                    code: Some(code),
                    message,
                }));
            }
        }
    }

    pub async fn send_text(&self, text: &str, mode: PersonaMode) -> Result<(), ChannelError> {
        self.send(&ClientMessage::TextInput {
            text: text.to_string(),
            mode,
        })
        .await
    }

    pub async fn send_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
        mode: PersonaMode,
    ) -> Result<(), ChannelError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(audio);
        self.send(&ClientMessage::AudioInput {
            audio: encoded,
            mime_type: mime_type.to_string(),
            mode,
        })
        .await
    }

    async fn send(&self, message: &ClientMessage) -> Result<(), ChannelError> {
        let frame = serde_json::to_value(message)
            .map_err(|e| ChannelError::Send(e.to_string()))?;
        self.channel.send(frame).await
    }
}

use crate::capture::{AudioCapture, CaptureController};
use crate::config::ClientConfig;
use crate::connection::{Channel, Connection};
use crate::error::{ClientError, ErrorKind};
use crate::events::{
    ClientEvent, ErrorEvent, EventDispatcher, EventKind, SettingsEvent, SubscriptionId,
};
use crate::session::{PersonaMode, SessionStatus, SharedSession};
use crate::storage::{KeyValueStore, DEVICE_ID_KEY};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The client: owns the session, the capture controller, and the connection
/// layer, and exposes the typed event surface to the host.
///
/// All failure modes surface through error events and status transitions;
/// invalid-state calls are warned no-ops.
pub struct VoiceClient {
    session: Arc<SharedSession>,
    dispatcher: Arc<EventDispatcher>,
    connection: Arc<Connection>,
    capture: Arc<CaptureController>,
    channel: Arc<dyn Channel>,
    channel_task: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceClient {
    /// Build a client from resolved configuration and injected
    /// capabilities. Generates and persists a device identifier when the
    /// configuration does not carry one.
    pub async fn new(
        config: ClientConfig,
        capture_backend: Box<dyn AudioCapture>,
        channel: Arc<dyn Channel>,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self, ClientError> {
        let config = config.resolve();

        let device_id = match &config.device_id {
            Some(id) => id.clone(),
            None => match store.get(DEVICE_ID_KEY).await? {
                Some(id) => id,
                None => {
                    let id = uuid::Uuid::new_v4().to_string();
                    store.put(DEVICE_ID_KEY, &id).await?;
                    info!("generated device id {}", id);
                    id
                }
            },
        };

        let dispatcher = Arc::new(EventDispatcher::new());
        let session = Arc::new(SharedSession::new(
            device_id,
            config.role,
            config.mode,
            config.vad.clone(),
            Arc::clone(&dispatcher),
        ));
        let connection = Arc::new(Connection::new(
            Arc::clone(&channel),
            Arc::clone(&session),
            Arc::clone(&dispatcher),
        ));
        let capture = Arc::new(CaptureController::new(
            capture_backend,
            Arc::clone(&session),
            Arc::clone(&dispatcher),
            Arc::clone(&connection),
        ));

        Ok(Self {
            session,
            dispatcher,
            connection,
            capture,
            channel,
            channel_task: Mutex::new(None),
        })
    }

    /// Open the channel. The session moves to Connecting immediately and to
    /// Idle once the link is up and the handshake is sent; a connect error
    /// leaves it Disconnected with an error event.
    pub async fn connect(&self) {
        // A stale event loop from a previous link must not keep delivering.
        if let Some(task) = self.channel_task.lock().await.take() {
            task.abort();
        }
        self.session.set_status(SessionStatus::Connecting);

        match self.channel.connect(&self.session.device_id()).await {
            Ok(mut events) => {
                let connection = Arc::clone(&self.connection);
                let task = tokio::spawn(async move {
                    while let Some(event) = events.recv().await {
                        connection.handle_event(event).await;
                    }
                });
                *self.channel_task.lock().await = Some(task);
            }
            Err(err) => {
                warn!("connect failed: {}", err);
                self.session.set_status(SessionStatus::Disconnected);
                self.dispatcher.emit(ClientEvent::Error(ErrorEvent {
                    kind: ErrorKind::Connection,
                    code: None,
                    message: err.to_string(),
                }));
            }
        }
    }

    /// Stop capture, tear the channel down, and leave the session
    /// Disconnected.
    pub async fn disconnect(&self) {
        Arc::clone(&self.capture).stop_listening().await;
        self.capture.cancel_restart().await;
        self.channel.disconnect().await;
        if let Some(task) = self.channel_task.lock().await.take() {
            task.abort();
        }
        if self.session.set_status(SessionStatus::Disconnected) {
            self.dispatcher.emit(ClientEvent::Disconnected);
        }
    }

    pub async fn start_listening(&self) {
        Arc::clone(&self.capture).start_listening().await;
    }

    pub async fn stop_listening(&self) {
        Arc::clone(&self.capture).stop_listening().await;
    }

    /// Send a text input. Warned no-op while disconnected.
    pub async fn send_text(&self, text: &str) {
        if !self.connection.is_connected() {
            warn!("send_text ignored: not connected");
            return;
        }
        if let Err(err) = self.connection.send_text(text, self.session.mode()).await {
            warn!("send_text failed: {}", err);
        }
    }

    /// Apply a partial settings update locally. Backend-initiated pushes
    /// arrive through the settings event instead.
    pub fn update_settings(&self, settings: SettingsEvent) {
        self.session.apply_settings(&settings);
    }

    /// Host signal for active playback. `true` moves the session to
    /// Speaking, `false` back to Idle; nothing inside the client ever sets
    /// Speaking on its own.
    pub fn set_speaking(&self, speaking: bool) {
        let status = if speaking {
            SessionStatus::Speaking
        } else {
            SessionStatus::Idle
        };
        self.session.set_status(status);
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<ClientEvent>) {
        self.dispatcher.subscribe(kind)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn mode(&self) -> PersonaMode {
        self.session.mode()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn device_id(&self) -> String {
        self.session.device_id()
    }
}

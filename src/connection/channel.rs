use crate::error::ChannelError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// What a transport can tell the translation layer.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The link is usable (initial connect or a successful reconnect).
    Up,
    /// The link dropped. The transport may still be retrying.
    Down,
    /// One inbound frame, already parsed as JSON.
    Message(serde_json::Value),
    /// The transport gave up (retries exhausted or a fatal error).
    Failed(String),
}

/// Realtime bidirectional transport, injected by the host.
///
/// The core consumes only these primitives; reconnection policy, framing
/// and negotiation are the transport's business. [`super::NatsChannel`] is
/// the bundled implementation.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Establish the link. Events arrive on the returned receiver, starting
    /// with [`ChannelEvent::Up`] once the link is usable.
    async fn connect(&self, identity: &str)
        -> Result<mpsc::Receiver<ChannelEvent>, ChannelError>;

    /// Send one JSON frame. Fails when the link is down.
    async fn send(&self, frame: serde_json::Value) -> Result<(), ChannelError>;

    /// Tear the link down. No further events are delivered.
    async fn disconnect(&self);
}

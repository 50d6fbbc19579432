use super::channel::{Channel, ChannelEvent};
use crate::config::ClientConfig;
use crate::error::ChannelError;
use async_trait::async_trait;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

/// Bundled transport: JSON frames over NATS subjects scoped per device.
///
/// Outbound frames go to `voice.ingress.<device>`, inbound frames arrive on
/// `voice.egress.<device>`. async-nats reconnects on its own; this layer
/// bounds that with the configured retry policy and reports `Failed` once
/// the bound is hit, dropping the client so the retrying stops.
pub struct NatsChannel {
    url: String,
    api_key: Option<String>,
    policy: ReconnectPolicy,
    state: Arc<Mutex<Option<Link>>>,
}

struct Link {
    client: async_nats::Client,
    ingress: String,
}

/// Consecutive-drop counter over the configured retry bound.
#[derive(Debug, Clone, Copy)]
struct ReconnectPolicy {
    auto_reconnect: bool,
    attempts: usize,
}

impl ReconnectPolicy {
    /// Whether the link is allowed another reconnect after `drops`
    /// consecutive losses.
    fn allows(&self, drops: usize) -> bool {
        self.auto_reconnect && drops <= self.attempts
    }
}

impl NatsChannel {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            url: config.server_url.clone(),
            api_key: config.api_key.clone(),
            policy: ReconnectPolicy {
                auto_reconnect: config.auto_reconnect,
                attempts: config.reconnect_attempts,
            },
            state: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl Channel for NatsChannel {
    async fn connect(
        &self,
        identity: &str,
    ) -> Result<mpsc::Receiver<ChannelEvent>, ChannelError> {
        info!("connecting to {}", self.url);

        let (tx, rx) = mpsc::channel(64);
        let (raw_tx, mut raw_rx) = mpsc::channel(64);

        let mut options = async_nats::ConnectOptions::new();
        if let Some(token) = &self.api_key {
            options = options.token(token.clone());
        }

        let event_tx = raw_tx;
        options = options.event_callback(move |event| {
            let tx = event_tx.clone();
            async move {
                match event {
                    async_nats::Event::Connected => {
                        let _ = tx.send(ChannelEvent::Up).await;
                    }
                    async_nats::Event::Disconnected => {
                        let _ = tx.send(ChannelEvent::Down).await;
                    }
                    async_nats::Event::ClientError(err) => {
                        let _ = tx.send(ChannelEvent::Failed(err.to_string())).await;
                    }
                    _ => {}
                }
            }
        });

        let client = options
            .connect(&self.url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        let egress = format!("voice.egress.{}", identity);
        let mut subscriber = client
            .subscribe(egress.clone())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        {
            let mut state = self.state.lock().await;
            *state = Some(Link {
                client,
                ingress: format!("voice.ingress.{}", identity),
            });
        }

        info!("connected, receiving on {}", egress);

        // The initial connect does not fire the Connected callback.
        let _ = tx.send(ChannelEvent::Up).await;

        // Apply the retry bound to the raw transport events. Dropping the
        // stored client is what actually stops async-nats from retrying.
        let policy = self.policy;
        let state = Arc::clone(&self.state);
        let policy_tx = tx.clone();
        tokio::spawn(async move {
            let mut drops = 0usize;
            while let Some(event) = raw_rx.recv().await {
                match event {
                    ChannelEvent::Up => {
                        drops = 0;
                        if policy_tx.send(ChannelEvent::Up).await.is_err() {
                            break;
                        }
                    }
                    ChannelEvent::Down => {
                        drops += 1;
                        if !policy.allows(drops) {
                            warn!("link lost, retry bound reached after {} drops", drops);
                            state.lock().await.take();
                            let _ = policy_tx
                                .send(ChannelEvent::Failed(
                                    "reconnect attempts exhausted".to_string(),
                                ))
                                .await;
                            break;
                        }
                        if policy_tx.send(ChannelEvent::Down).await.is_err() {
                            break;
                        }
                    }
                    other => {
                        if policy_tx.send(other).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                match serde_json::from_slice(&message.payload) {
                    Ok(frame) => {
                        if tx.send(ChannelEvent::Message(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("dropping malformed frame: {}", err),
                }
            }
            let _ = tx.send(ChannelEvent::Down).await;
        });

        Ok(rx)
    }

    async fn send(&self, frame: serde_json::Value) -> Result<(), ChannelError> {
        let state = self.state.lock().await;
        let link = state.as_ref().ok_or(ChannelError::NotConnected)?;
        let payload = serde_json::to_vec(&frame).map_err(|e| ChannelError::Send(e.to_string()))?;
        link.client
            .publish(link.ingress.clone(), payload.into())
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }

    async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if let Some(link) = state.take() {
            if let Err(err) = link.client.flush().await {
                warn!("flush on disconnect failed: {}", err);
            }
            // async-nats closes the connection when the client drops.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReconnectPolicy;

    #[test]
    fn policy_allows_up_to_the_configured_attempts() {
        let policy = ReconnectPolicy {
            auto_reconnect: true,
            attempts: 3,
        };
        assert!(policy.allows(1));
        assert!(policy.allows(3));
        assert!(!policy.allows(4));
    }

    #[test]
    fn policy_rejects_every_drop_with_auto_reconnect_off() {
        let policy = ReconnectPolicy {
            auto_reconnect: false,
            attempts: 3,
        };
        assert!(!policy.allows(1));
    }
}

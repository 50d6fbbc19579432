use super::{ClientEvent, EventKind};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Identity of one subscription, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: u64,
    kind: EventKind,
    tx: mpsc::UnboundedSender<ClientEvent>,
}

/// Ordered multi-subscriber dispatch.
///
/// Subscribers for the same kind are notified in registration order. The
/// lock is never held across an await; sends are non-blocking.
pub struct EventDispatcher {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 0,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Register for one event kind. The receiver yields matching events in
    /// emission order.
    pub fn subscribe(
        &self,
        kind: EventKind,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().expect("dispatcher lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber { id, kind, tx });
        (SubscriptionId(id), rx)
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock().expect("dispatcher lock poisoned");
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id.0);
        inner.subscribers.len() != before
    }

    /// Deliver an event to every live subscriber of its kind, dropping
    /// subscribers whose receivers are gone.
    pub fn emit(&self, event: ClientEvent) {
        let kind = event.kind();
        let mut inner = self.inner.lock().expect("dispatcher lock poisoned");
        inner.subscribers.retain(|s| {
            if s.kind != kind {
                return true;
            }
            match s.tx.send(event.clone()) {
                Ok(()) => true,
                Err(_) => {
                    debug!("dropping closed subscriber {}", s.id);
                    false
                }
            }
        });
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

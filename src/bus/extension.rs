use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::bus::message::{Acknowledgement, DispatchMessage};
use crate::config::BusConfig;

/// Outcome of a single send as seen by the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The content script handled the message and replied.
    Acknowledged(Acknowledgement),
    /// The message was handed to a listener but no reply arrived.
    Delivered,
    /// No listener took the message; it was dropped.
    Undelivered(String),
}

impl Delivery {
    pub fn acknowledgement(&self) -> Option<&Acknowledgement> {
        match self {
            Delivery::Acknowledged(ack) => Some(ack),
            _ => None,
        }
    }
}

/// Popup side of the bus. Sending never fails from the caller's point of view.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: DispatchMessage) -> Delivery;
}

/// Content-script side handler, invoked once per delivered message.
pub trait MessageHandler: Send + 'static {
    fn handle(&mut self, message: DispatchMessage) -> Option<Acknowledgement>;
}

struct Envelope {
    payload: serde_json::Value,
    reply: oneshot::Sender<Acknowledgement>,
}

struct ActiveListener {
    id: u64,
    tx: mpsc::Sender<Envelope>,
}

struct BusInner {
    active: Mutex<Option<ActiveListener>>,
    capacity: usize,
    ack_timeout: Duration,
    next_listener: AtomicU64,
}

/// In-process relay between the popup and the content script of the active tab.
///
/// Only one content script is addressed at a time; attaching a new one replaces
/// the previous listener, whose receive loop then ends.
#[derive(Clone)]
pub struct ExtensionBus {
    inner: Arc<BusInner>,
}

impl ExtensionBus {
    pub fn new(capacity: usize, ack_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(BusInner {
                active: Mutex::new(None),
                capacity: capacity.max(1),
                ack_timeout,
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::new(config.capacity, Duration::from_millis(config.ack_timeout_ms))
    }

    /// Register the content script of the (newly) active tab.
    pub fn attach_content_script(&self) -> ContentScriptPort {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let previous = self.lock_active().replace(ActiveListener { id, tx });
        if let Some(prev) = previous {
            tracing::debug!(previous = prev.id, listener = id, "content script replaced");
        } else {
            tracing::debug!(listener = id, "content script attached");
        }
        ContentScriptPort { id, rx }
    }

    /// Forget the active content script, e.g. after the tab navigated away.
    pub fn detach_content_script(&self) {
        if let Some(prev) = self.lock_active().take() {
            tracing::debug!(listener = prev.id, "content script detached");
        }
    }

    pub fn has_listener(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|l| !l.tx.is_closed())
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActiveListener>> {
        self.inner.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_listener(&self) -> Option<(u64, mpsc::Sender<Envelope>)> {
        self.lock_active().as_ref().map(|l| (l.id, l.tx.clone()))
    }

    fn drop_listener(&self, id: u64) {
        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|l| l.id == id) {
            *active = None;
        }
    }
}

#[async_trait]
impl MessageSender for ExtensionBus {
    async fn send(&self, message: DispatchMessage) -> Delivery {
        let action = message.action();
        let payload = match serde_json::to_value(&message) {
            Ok(v) => v,
            Err(e) => return Delivery::Undelivered(format!("encode failed: {e}")),
        };

        let Some((listener, tx)) = self.current_listener() else {
            tracing::debug!(action, "no content script in the active tab, message dropped");
            return Delivery::Undelivered("no content script listening".into());
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        match tx.try_send(Envelope { payload, reply: reply_tx }) {
            Ok(()) => {}
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(action, listener, "content script torn down, message dropped");
                self.drop_listener(listener);
                return Delivery::Undelivered("content script torn down".into());
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(action, listener, "content script queue full, message dropped");
                return Delivery::Undelivered("content script queue full".into());
            }
        }

        match tokio::time::timeout(self.inner.ack_timeout, reply_rx).await {
            Ok(Ok(ack)) => {
                tracing::debug!(action, listener, success = ack.success, "message acknowledged");
                Delivery::Acknowledged(ack)
            }
            Ok(Err(_)) => Delivery::Delivered,
            Err(_) => {
                tracing::debug!(action, listener, "no acknowledgment before timeout");
                Delivery::Delivered
            }
        }
    }
}

/// Receiving end held by a content script.
pub struct ContentScriptPort {
    id: u64,
    rx: mpsc::Receiver<Envelope>,
}

impl ContentScriptPort {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Run `handler` on a background task until the port is replaced or detached.
    pub fn receive<H: MessageHandler>(self, handler: H) -> JoinHandle<()> {
        tokio::spawn(self.run(handler))
    }

    /// Process deliveries in arrival order until the bus stops addressing this port.
    pub async fn run<H: MessageHandler>(mut self, mut handler: H) {
        while let Some(envelope) = self.rx.recv().await {
            let Some(message) = DispatchMessage::decode(&envelope.payload) else {
                continue;
            };
            if let Some(ack) = handler.handle(message) {
                // The popup may have stopped waiting; a lost ack is fine.
                let _ = envelope.reply.send(ack);
            }
        }
        tracing::debug!(listener = self.id, "content script listener stopped");
    }
}

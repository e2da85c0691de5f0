//! # Transport Seam
//!
//! The bus runs over any pub/sub transport offering fire-and-forget publish,
//! bounded request/reply, and wildcard subscribe. Implementations must
//! deliver individual messages reliably (at-least-once) and tolerate
//! concurrent publishes from many tasks on one shared handle.

use async_trait::async_trait;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// One message delivered by the transport.
#[derive(Debug, Clone)]
pub struct TransportMessage {
    /// Full topic the message was published on.
    pub topic: String,
    /// Raw payload bytes; the codec owns their meaning.
    pub payload: Vec<u8>,
    /// Per-call inbox to publish the reply on, when the sender expects one.
    pub reply_to: Option<String>,
}

/// Errors surfaced by transport implementations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No reply arrived inside the deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Nothing is subscribed to the request topic.
    #[error("no responders on {0}")]
    NoResponders(String),

    /// The transport connection is gone.
    #[error("transport closed")]
    Closed,
}

/// Contract every transport adapter implements.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fire-and-forget publish.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Publish and wait for one correlated reply, bounded by `timeout`.
    ///
    /// Implementations may fail fast with `NoResponders` when they can tell
    /// nothing is listening; callers treat that the same as a timeout.
    async fn request(
        &self,
        topic: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;

    /// Open a wildcard subscription on `pattern`.
    async fn subscribe(&self, pattern: &str) -> Result<Subscription, TransportError>;
}

type UnsubscribeFn = Box<dyn FnOnce() + Send>;

/// A live subscription yielding inbound messages.
///
/// Delivery stops when `unsubscribe` is called or the handle is dropped,
/// whichever comes first.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<TransportMessage>,
    unsub: Option<UnsubscribeFn>,
}

impl Subscription {
    /// Assemble a subscription from its receiving end and the hook that
    /// removes it from the transport's registry.
    pub fn new(rx: mpsc::UnboundedReceiver<TransportMessage>, unsub: UnsubscribeFn) -> Self {
        Self {
            rx,
            unsub: Some(unsub),
        }
    }

    /// Next message; `None` once the transport has dropped this
    /// subscription's sending side.
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        self.rx.recv().await
    }

    /// Stop delivery now instead of at drop time. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(unsub) = self.unsub.take() {
            unsub();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl tokio_stream::Stream for Subscription {
    type Item = TransportMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

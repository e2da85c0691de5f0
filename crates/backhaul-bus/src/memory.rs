//! # In-Process Transport
//!
//! A single-process broker for tests and embedded wiring. Topic semantics
//! follow the subject scheme: a pattern ending in `.>` matches any deeper
//! suffix, anything else matches exactly. Request/reply rides a unique
//! per-call inbox topic.

use crate::transport::{Subscription, Transport, TransportError, TransportMessage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Topic prefix for per-call reply inboxes.
const INBOX_PREFIX: &str = "_INBOX.";

struct TopicSub {
    pattern: String,
    tx: mpsc::UnboundedSender<TransportMessage>,
}

#[derive(Default)]
struct Registry {
    subs: RwLock<HashMap<u64, TopicSub>>,
    next_id: AtomicU64,
}

/// In-memory pub/sub broker.
///
/// Clones share one registry, so any clone can publish to subscriptions
/// opened through any other.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    registry: Arc<Registry>,
}

impl MemoryTransport {
    /// A broker with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions, inboxes included.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.registry
            .subs
            .read()
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    /// Fan a message out to every matching subscription; returns how many
    /// received it.
    fn deliver(&self, msg: &TransportMessage) -> usize {
        let Ok(subs) = self.registry.subs.read() else {
            return 0;
        };
        let mut delivered = 0;
        for sub in subs.values() {
            if pattern_matches(&sub.pattern, &msg.topic) && sub.tx.send(msg.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn add_subscription(&self, pattern: &str) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subs) = self.registry.subs.write() {
            subs.insert(
                id,
                TopicSub {
                    pattern: pattern.to_string(),
                    tx,
                },
            );
        }
        debug!(pattern = %pattern, id, "subscription opened");

        let registry = Arc::clone(&self.registry);
        Subscription::new(
            rx,
            Box::new(move || {
                if let Ok(mut subs) = registry.subs.write() {
                    subs.remove(&id);
                }
            }),
        )
    }
}

/// `true` when `pattern` covers `topic`.
fn pattern_matches(pattern: &str, topic: &str) -> bool {
    match pattern.strip_suffix(".>") {
        Some(prefix) => topic
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.')),
        None => pattern == topic,
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let msg = TransportMessage {
            topic: topic.to_string(),
            payload,
            reply_to: None,
        };
        let delivered = self.deliver(&msg);
        debug!(topic = %topic, delivered, "published");
        Ok(())
    }

    async fn request(
        &self,
        topic: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let inbox = format!("{INBOX_PREFIX}{}", Uuid::new_v4());
        let mut replies = self.add_subscription(&inbox);

        let msg = TransportMessage {
            topic: topic.to_string(),
            payload,
            reply_to: Some(inbox),
        };
        if self.deliver(&msg) == 0 {
            return Err(TransportError::NoResponders(topic.to_string()));
        }

        match tokio::time::timeout(timeout, replies.recv()).await {
            Ok(Some(reply)) => Ok(reply.payload),
            Ok(None) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    async fn subscribe(&self, pattern: &str) -> Result<Subscription, TransportError> {
        Ok(self.add_subscription(pattern))
    }
}

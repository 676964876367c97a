//! Completion notifications for observers
//!
//! A notification is delivered on a named topic with confirmed delivery: a
//! [`Notifier`] returns `Ok` only once the payload reached at least one
//! receiver. Two transports are provided:
//! - [`BroadcastNotifier`] fans out in-process to connected WebSocket observers
//! - [`WebhookNotifier`] POSTs the payload to an HTTP endpoint

mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::slots::{CheckInEntry, CoffeeOrder};
use crate::{Error, Result};

pub use webhook::{TOPIC_HEADER, WebhookNotifier};

/// Channel capacity for broadcast observers
const CHANNEL_CAPACITY: usize = 64;

/// Payload announced when a conversation completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A coffee order was saved
    OrderComplete { order: CoffeeOrder },
    /// A wellness check-in was saved
    WellnessUpdate { data: CheckInEntry },
}

impl Notification {
    /// Encode the payload as UTF-8 JSON bytes
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A notification addressed to a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicMessage {
    /// Topic name (e.g. `order_complete`)
    pub topic: String,
    /// Notification payload
    pub payload: Notification,
}

/// Transport for completion notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &'static str;

    /// Deliver a notification, returning only once delivery is confirmed
    ///
    /// # Errors
    ///
    /// Returns [`Error::Notify`] if no receiver accepted the payload
    async fn deliver(&self, topic: &str, notification: &Notification) -> Result<()>;
}

/// In-process fan-out to subscribed observers
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<TopicMessage>,
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastNotifier {
    /// Create a notifier with no observers
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to every notification delivered from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TopicMessage> {
        self.tx.subscribe()
    }

    /// Number of currently subscribed observers
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    async fn deliver(&self, topic: &str, notification: &Notification) -> Result<()> {
        let message = TopicMessage {
            topic: topic.to_string(),
            payload: notification.clone(),
        };

        let receivers = self
            .tx
            .send(message)
            .map_err(|_| Error::Notify(format!("no observers subscribed to {topic}")))?;

        tracing::debug!(topic, receivers, "delivered notification");
        Ok(())
    }
}

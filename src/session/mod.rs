//! Per-conversation slot state and its transitions
//!
//! A [`Conversation`] owns the live form for exactly one conversation. The
//! driver serializes calls, so transitions never overlap for one instance.
//!
//! Completion runs in a fixed order:
//! 1. check the completion gate (incomplete: nothing else happens)
//! 2. persist a copy of the form
//! 3. deliver the notification
//! 4. reset the form
//!
//! A persistence failure leaves the form untouched so the same data can be
//! retried. A delivery failure happens after the record is durable: the form
//! is still reset and the undelivered notification is kept for
//! [`Conversation::retry_announcement`].
//!
//! Partial forms saved when a conversation ends early go to a separate draft
//! store, never to the store of completed records.

mod registry;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::notify::{Notification, Notifier};
use crate::slots::{CompletionGate, SlotForm};
use crate::store::RecordStore;
use crate::{Error, Result};

pub use registry::{SessionHandle, SessionRegistry};

/// Outcome of a completion attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion<R> {
    /// Required fields are still unset; the conversation continues
    Incomplete { missing: Vec<&'static str> },
    /// The record was persisted and announced
    Completed { record: R },
}

impl<R> Completion<R> {
    /// Persisted record, if completion went through
    #[must_use]
    pub const fn record(&self) -> Option<&R> {
        match self {
            Self::Completed { record } => Some(record),
            Self::Incomplete { .. } => None,
        }
    }
}

/// What to do with a partially filled form when a conversation ends early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Drop the partial form
    #[default]
    Discard,
    /// Write the partial form to the draft store without gating or notifying
    Persist,
}

/// Announcement that was persisted but not yet delivered
#[derive(Debug, Clone)]
struct PendingAnnouncement {
    topic: String,
    notification: Notification,
}

/// Slot state for one conversation plus the collaborators it completes into
pub struct Conversation<F: SlotForm> {
    form: F,
    gate: CompletionGate,
    topic: String,
    store: Arc<dyn RecordStore<F::Record>>,
    drafts: Option<Arc<dyn RecordStore<F::Record>>>,
    notifier: Arc<dyn Notifier>,
    pending: Option<PendingAnnouncement>,
}

impl<F: SlotForm> std::fmt::Debug for Conversation<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("gate", &self.gate)
            .field("topic", &self.topic)
            .field("notifier", &self.notifier.name())
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

impl<F: SlotForm> Conversation<F> {
    /// Start a conversation with an empty form
    #[must_use]
    pub fn new(
        gate: CompletionGate,
        topic: impl Into<String>,
        store: Arc<dyn RecordStore<F::Record>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            form: F::default(),
            gate,
            topic: topic.into(),
            store,
            drafts: None,
            notifier,
            pending: None,
        }
    }

    /// Store for partial forms kept by [`Disposition::Persist`]
    #[must_use]
    pub fn with_drafts(mut self, drafts: Arc<dyn RecordStore<F::Record>>) -> Self {
        self.drafts = Some(drafts);
        self
    }

    /// Current form
    #[must_use]
    pub const fn form(&self) -> &F {
        &self.form
    }

    /// Completion gate in effect
    #[must_use]
    pub const fn gate(&self) -> CompletionGate {
        self.gate
    }

    /// Topic completion notifications are delivered on
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Merge a partial update and return the resulting form
    pub fn apply_update(&mut self, update: F::Update) -> &F {
        self.form.apply_update(update);
        &self.form
    }

    /// Whether the form passes the completion gate
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Required fields the gate is still waiting for
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        self.gate.missing(&self.form)
    }

    /// Whether an announcement is waiting for redelivery
    #[must_use]
    pub const fn has_pending_announcement(&self) -> bool {
        self.pending.is_some()
    }

    /// Persist, announce, and reset
    ///
    /// # Errors
    ///
    /// - [`Error::Store`] (or I/O) if persisting fails; the form is unchanged
    /// - [`Error::NotAnnounced`] if delivery fails after the record was saved;
    ///   the form is reset and the notification kept for retry
    pub async fn complete(&mut self) -> Result<Completion<F::Record>> {
        let missing = self.missing();
        if !missing.is_empty() {
            tracing::debug!(topic = %self.topic, ?missing, "completion requested early");
            return Ok(Completion::Incomplete { missing });
        }

        let record = self.form.to_record(Utc::now());
        self.store.save(&record).await?;

        let notification = F::notification(&record);
        let delivery = self.notifier.deliver(&self.topic, &notification).await;

        self.form = F::default();

        if let Err(e) = delivery {
            tracing::warn!(
                topic = %self.topic,
                notifier = self.notifier.name(),
                error = %e,
                "record saved but notification not delivered"
            );
            self.pending = Some(PendingAnnouncement {
                topic: self.topic.clone(),
                notification,
            });
            return Err(Error::NotAnnounced {
                topic: self.topic.clone(),
                reason: e.to_string(),
            });
        }

        tracing::info!(topic = %self.topic, "conversation completed");
        Ok(Completion::Completed { record })
    }

    /// Redeliver an announcement whose first delivery failed
    ///
    /// Returns `false` when nothing was pending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAnnounced`] if delivery fails again
    pub async fn retry_announcement(&mut self) -> Result<bool> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };

        if let Err(e) = self
            .notifier
            .deliver(&pending.topic, &pending.notification)
            .await
        {
            let topic = pending.topic.clone();
            self.pending = Some(pending);
            return Err(Error::NotAnnounced {
                topic,
                reason: e.to_string(),
            });
        }

        tracing::info!(topic = %pending.topic, "pending notification delivered");
        Ok(true)
    }

    /// End the conversation before completion
    ///
    /// Returns the persisted partial record for [`Disposition::Persist`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if no draft store is configured or the save
    /// fails; the form is kept in both cases
    pub async fn end(&mut self, disposition: Disposition) -> Result<Option<F::Record>> {
        match disposition {
            Disposition::Discard => {
                self.form = F::default();
                tracing::debug!(topic = %self.topic, "partial form discarded");
                Ok(None)
            }
            Disposition::Persist => {
                let Some(drafts) = &self.drafts else {
                    return Err(Error::Store(format!(
                        "no draft store configured for {}",
                        self.topic
                    )));
                };

                let record = self.form.to_record(Utc::now());
                drafts.save(&record).await?;
                self.form = F::default();

                tracing::info!(
                    topic = %self.topic,
                    path = %drafts.location().display(),
                    "partial form persisted"
                );
                Ok(Some(record))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::slots::{CheckIn, CoffeeOrder, OrderUpdate};

    /// Store double recording every save
    struct MemoryStore<R> {
        saved: Mutex<Vec<R>>,
        fail: AtomicBool,
        path: PathBuf,
    }

    impl<R> Default for MemoryStore<R> {
        fn default() -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
                path: PathBuf::from("memory"),
            }
        }
    }

    #[async_trait]
    impl<R: Clone + Send + Sync> RecordStore<R> for MemoryStore<R> {
        async fn save(&self, record: &R) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Store("disk full".to_string()));
            }
            self.saved.lock().await.push(record.clone());
            Ok(())
        }

        fn location(&self) -> &Path {
            &self.path
        }
    }

    /// Notifier double recording every delivery
    #[derive(Default)]
    struct MemoryNotifier {
        delivered: Mutex<Vec<(String, Notification)>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl Notifier for MemoryNotifier {
        fn name(&self) -> &'static str {
            "memory"
        }

        async fn deliver(&self, topic: &str, notification: &Notification) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Notify("observer offline".to_string()));
            }
            self.delivered
                .lock()
                .await
                .push((topic.to_string(), notification.clone()));
            Ok(())
        }
    }

    fn barista() -> (
        Conversation<CoffeeOrder>,
        Arc<MemoryStore<CoffeeOrder>>,
        Arc<MemoryNotifier>,
    ) {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MemoryNotifier::default());
        let conversation = Conversation::<CoffeeOrder>::new(
            CompletionGate::Required,
            "order_complete",
            store.clone(),
            notifier.clone(),
        );
        (conversation, store, notifier)
    }

    fn update(json: &str) -> OrderUpdate {
        serde_json::from_str(json).unwrap()
    }

    fn fill(conversation: &mut Conversation<CoffeeOrder>) {
        conversation.apply_update(update(r#"{"drinkType":"latte"}"#));
        conversation.apply_update(update(r#"{"size":"medium","milk":"oat"}"#));
        conversation.apply_update(update(r#"{"extras":["vanilla syrup"]}"#));
        conversation.apply_update(update(r#"{"name":"Ana"}"#));
    }

    #[tokio::test]
    async fn incomplete_completion_touches_nothing() {
        let (mut conversation, store, notifier) = barista();
        conversation.apply_update(update(r#"{"drinkType":"latte","extras":["ice"]}"#));
        let before = conversation.form().clone();

        let outcome = conversation.complete().await.unwrap();

        assert_eq!(
            outcome,
            Completion::Incomplete {
                missing: vec!["size", "milk", "name"]
            }
        );
        assert_eq!(conversation.form(), &before);
        assert!(store.saved.lock().await.is_empty());
        assert!(notifier.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn completion_persists_announces_and_resets() {
        let (mut conversation, store, notifier) = barista();
        fill(&mut conversation);
        let before = conversation.form().clone();

        let outcome = conversation.complete().await.unwrap();

        assert_eq!(outcome.record(), Some(&before));
        assert_eq!(store.saved.lock().await.as_slice(), [before.clone()]);
        assert_eq!(conversation.form(), &CoffeeOrder::default());

        let delivered = notifier.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "order_complete");
        assert_eq!(delivered[0].1, Notification::OrderComplete { order: before });
    }

    #[tokio::test]
    async fn store_failure_keeps_the_form_and_skips_notification() {
        let (mut conversation, store, notifier) = barista();
        fill(&mut conversation);
        let before = conversation.form().clone();
        store.fail.store(true, Ordering::SeqCst);

        let result = conversation.complete().await;

        assert!(matches!(result, Err(Error::Store(_))));
        assert_eq!(conversation.form(), &before);
        assert!(notifier.delivered.lock().await.is_empty());

        store.fail.store(false, Ordering::SeqCst);
        let outcome = conversation.complete().await.unwrap();
        assert_eq!(outcome.record(), Some(&before));
    }

    #[tokio::test]
    async fn delivery_failure_is_saved_but_not_announced() {
        let (mut conversation, store, notifier) = barista();
        fill(&mut conversation);
        notifier.fail.store(true, Ordering::SeqCst);

        let err = conversation.complete().await.unwrap_err();

        assert!(err.is_persisted());
        assert_eq!(store.saved.lock().await.len(), 1);
        assert_eq!(conversation.form(), &CoffeeOrder::default());
        assert!(conversation.has_pending_announcement());

        // Redelivery does not persist a second copy
        notifier.fail.store(false, Ordering::SeqCst);
        assert!(conversation.retry_announcement().await.unwrap());
        assert!(!conversation.has_pending_announcement());
        assert_eq!(store.saved.lock().await.len(), 1);
        assert_eq!(notifier.delivered.lock().await.len(), 1);

        assert!(!conversation.retry_announcement().await.unwrap());
    }

    #[tokio::test]
    async fn failed_retry_keeps_the_announcement_pending() {
        let (mut conversation, _store, notifier) = barista();
        fill(&mut conversation);
        notifier.fail.store(true, Ordering::SeqCst);

        let _ = conversation.complete().await;
        assert!(conversation.retry_announcement().await.is_err());
        assert!(conversation.has_pending_announcement());
    }

    #[tokio::test]
    async fn second_completion_sees_a_fresh_form() {
        let (mut conversation, store, _notifier) = barista();
        fill(&mut conversation);
        conversation.complete().await.unwrap();

        let outcome = conversation.complete().await.unwrap();
        assert!(matches!(outcome, Completion::Incomplete { missing } if missing.len() == 4));
        assert_eq!(store.saved.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn trusted_gate_completes_without_required_fields() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MemoryNotifier::default());
        let mut conversation = Conversation::<CheckIn>::new(
            CompletionGate::Trusted,
            "wellness_update",
            store.clone(),
            notifier,
        );
        conversation.apply_update(serde_json::from_str(r#"{"mood":"tired"}"#).unwrap());

        let outcome = conversation.complete().await.unwrap();

        let entry = outcome.record().unwrap();
        assert_eq!(entry.mood.as_deref(), Some("tired"));
        assert!(entry.energy.is_none());
        assert_eq!(store.saved.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn required_gate_applies_to_wellness_when_configured() {
        let mut conversation = Conversation::<CheckIn>::new(
            CompletionGate::Required,
            "wellness_update",
            Arc::new(MemoryStore::default()),
            Arc::new(MemoryNotifier::default()),
        );
        conversation.apply_update(serde_json::from_str(r#"{"mood":"tired"}"#).unwrap());

        let outcome = conversation.complete().await.unwrap();
        assert_eq!(
            outcome,
            Completion::Incomplete {
                missing: vec!["energy", "goals"]
            }
        );
    }

    #[tokio::test]
    async fn end_discard_drops_partial_state() {
        let (mut conversation, store, _notifier) = barista();
        conversation.apply_update(update(r#"{"drinkType":"latte"}"#));

        assert!(conversation.end(Disposition::Discard).await.unwrap().is_none());
        assert_eq!(conversation.form(), &CoffeeOrder::default());
        assert!(store.saved.lock().await.is_empty());
    }

    #[tokio::test]
    async fn end_persist_saves_partial_state_to_drafts_only() {
        let (conversation, store, notifier) = barista();
        let drafts = Arc::new(MemoryStore::<CoffeeOrder>::default());
        let mut conversation = conversation.with_drafts(drafts.clone());
        conversation.apply_update(update(r#"{"drinkType":"latte"}"#));

        let record = conversation.end(Disposition::Persist).await.unwrap().unwrap();

        assert_eq!(record.drink_type.as_deref(), Some("latte"));
        assert_eq!(drafts.saved.lock().await.as_slice(), [record]);
        assert!(store.saved.lock().await.is_empty());
        assert!(notifier.delivered.lock().await.is_empty());
        assert_eq!(conversation.form(), &CoffeeOrder::default());
    }

    #[tokio::test]
    async fn end_persist_without_drafts_keeps_the_form() {
        let (mut conversation, store, _notifier) = barista();
        conversation.apply_update(update(r#"{"drinkType":"latte"}"#));
        let before = conversation.form().clone();

        let result = conversation.end(Disposition::Persist).await;

        assert!(matches!(result, Err(Error::Store(_))));
        assert_eq!(conversation.form(), &before);
        assert!(store.saved.lock().await.is_empty());
    }

    #[tokio::test]
    async fn failed_draft_save_keeps_the_form() {
        let (conversation, _store, _notifier) = barista();
        let drafts = Arc::new(MemoryStore::<CoffeeOrder>::default());
        drafts.fail.store(true, Ordering::SeqCst);
        let mut conversation = conversation.with_drafts(drafts);
        conversation.apply_update(update(r#"{"name":"Ana"}"#));

        assert!(conversation.end(Disposition::Persist).await.is_err());
        assert_eq!(conversation.form().name.as_deref(), Some("Ana"));
    }
}

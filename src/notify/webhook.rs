//! HTTP webhook transport for completion notifications

use std::time::Duration;

use async_trait::async_trait;

use super::{Notification, Notifier};
use crate::{Error, Result};

/// Header carrying the notification topic
pub const TOPIC_HEADER: &str = "x-slotline-topic";

/// Delivers notifications as JSON POST requests
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a webhook notifier for `url`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Target URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, topic: &str, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header(TOPIC_HEADER, topic)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(notification.to_bytes()?)
            .send()
            .await
            .map_err(|e| Error::Notify(format!("webhook request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notify(format!("webhook returned {status}: {body}")));
        }

        tracing::debug!(topic, url = %self.url, "webhook notification accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
    use tokio::sync::Mutex;

    use super::*;
    use crate::slots::CheckIn;
    use crate::slots::SlotForm;

    type Received = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

    async fn record(
        State(received): State<Received>,
        headers: HeaderMap,
        body: String,
    ) -> StatusCode {
        let topic = headers
            .get(TOPIC_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let value = serde_json::from_str(&body).unwrap_or_default();
        received.lock().await.push((topic, value));
        StatusCode::NO_CONTENT
    }

    async fn spawn_receiver(status_ok: bool) -> (String, Received) {
        let received: Received = Arc::default();
        let app = if status_ok {
            Router::new()
                .route("/hook", post(record))
                .with_state(received.clone())
        } else {
            Router::new().route("/hook", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/hook"), received)
    }

    fn wellness_update() -> Notification {
        let form = CheckIn {
            mood: Some("tired".to_string()),
            energy: Some("low".to_string()),
            goals: vec!["drink water".to_string()],
        };
        CheckIn::notification(&form.to_record(chrono::Utc::now()))
    }

    #[tokio::test]
    async fn posts_payload_with_topic_header() {
        let (url, received) = spawn_receiver(true).await;
        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();

        notifier
            .deliver("wellness_update", &wellness_update())
            .await
            .unwrap();

        let received = received.lock().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "wellness_update");
        assert_eq!(received[0].1["type"], "wellness_update");
        assert_eq!(received[0].1["data"]["energy"], "low");
    }

    #[tokio::test]
    async fn non_success_status_is_a_delivery_failure() {
        let (url, _) = spawn_receiver(false).await;
        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();

        let result = notifier.deliver("wellness_update", &wellness_update()).await;
        assert!(matches!(result, Err(Error::Notify(msg)) if msg.contains("503")));
    }
}

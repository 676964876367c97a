//! WebSocket feed of completion notifications for observers (receipts, dashboards)

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade, ws::Message},
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use crate::notify::{BroadcastNotifier, Notification};

/// Incoming WebSocket message from an observer
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventsWsIncoming {
    /// Ping to keep connection alive
    Ping,
}

/// Outgoing WebSocket message to an observer
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventsWsOutgoing {
    /// Connection established
    Connected,
    /// Notification delivered on a topic
    Data {
        topic: String,
        payload: Notification,
    },
    /// Pong response
    Pong,
}

/// Build events WebSocket router
pub fn router(events: Arc<BroadcastNotifier>) -> Router {
    Router::new()
        .route("/events", get(ws_upgrade))
        .with_state(events)
}

/// Handle WebSocket upgrade request
async fn ws_upgrade(
    State(events): State<Arc<BroadcastNotifier>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

/// Handle WebSocket connection
async fn handle_socket(socket: axum::extract::ws::WebSocket, events: Arc<BroadcastNotifier>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before announcing so nothing delivered after `connected` is missed
    let mut rx = events.subscribe();

    if let Ok(msg) = serde_json::to_string(&EventsWsOutgoing::Connected)
        && sender.send(Message::Text(msg.into())).await.is_err()
    {
        return;
    }

    tracing::info!(observers = events.observer_count(), "events WebSocket connected");

    let (pong_tx, mut pong_rx) = tokio::sync::mpsc::channel::<()>(8);

    // Forward notifications and pongs to the socket
    let mut send_task = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                message = rx.recv() => match message {
                    Ok(message) => EventsWsOutgoing::Data {
                        topic: message.topic,
                        payload: message.payload,
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "events observer lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                Some(()) = pong_rx.recv() => EventsWsOutgoing::Pong,
            };

            if let Ok(text) = serde_json::to_string(&outgoing)
                && sender.send(Message::Text(text.into())).await.is_err()
            {
                break;
            }
        }
    });

    // Handle incoming messages
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str(&text) {
                    Ok(EventsWsIncoming::Ping) => {
                        if pong_tx.send(()).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "ignoring observer message"),
                },
                Message::Close(_) => {
                    tracing::info!("events WebSocket closed by client");
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::info!("events WebSocket disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::CoffeeOrder;

    #[test]
    fn data_frame_carries_topic_and_payload() {
        let frame = EventsWsOutgoing::Data {
            topic: "order_complete".to_string(),
            payload: Notification::OrderComplete {
                order: CoffeeOrder {
                    name: Some("Ana".to_string()),
                    ..CoffeeOrder::default()
                },
            },
        };

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "data");
        assert_eq!(value["topic"], "order_complete");
        assert_eq!(value["payload"]["type"], "order_complete");
        assert_eq!(value["payload"]["order"]["name"], "Ana");
    }

    #[test]
    fn ping_parses() {
        let incoming: EventsWsIncoming = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(incoming, EventsWsIncoming::Ping));
    }
}

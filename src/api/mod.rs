//! HTTP API server for slotline
//!
//! The conversation driver creates a session per conversation and forwards
//! the language model's tool calls to it. Observers follow completions over
//! `/ws/events`.

mod error;
pub mod health;
pub mod records;
pub mod sessions;
pub mod websocket;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::assistant::AssistantFactory;
use crate::notify::BroadcastNotifier;
use crate::session::SessionRegistry;

pub use error::ApiError;

/// Shared state for API handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Live conversations
    pub sessions: SessionRegistry,
    /// Builds assistants wired to the shared stores
    pub factory: AssistantFactory,
    /// Fan-out to `/ws/events` observers
    pub events: Arc<BroadcastNotifier>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    factory: AssistantFactory,
    events: Arc<BroadcastNotifier>,
    sessions: SessionRegistry,
    port: u16,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(factory: AssistantFactory, events: Arc<BroadcastNotifier>, port: u16) -> Self {
        Self {
            factory,
            events,
            sessions: SessionRegistry::new(),
            port,
        }
    }

    /// Use an existing session registry
    #[must_use]
    pub fn sessions(mut self, sessions: SessionRegistry) -> Self {
        self.sessions = sessions;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState {
                sessions: self.sessions,
                factory: self.factory,
                events: self.events,
            }),
            port: self.port,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let router = Router::new()
            .nest("/api/sessions", sessions::router(self.state.clone()))
            .merge(records::router(self.state.clone()))
            .nest("/ws", websocket::router(self.state.events.clone()))
            .merge(health::router());

        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

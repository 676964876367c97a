//! Conversation session endpoints
//!
//! - `POST /api/sessions` starts a conversation
//! - `GET /api/sessions/{id}` returns the current form
//! - `POST /api/sessions/{id}/tools/{name}` executes a tool call
//! - `POST /api/sessions/{id}/announce` retries a pending announcement
//! - `DELETE /api/sessions/{id}` ends the conversation

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiError, ApiState};
use crate::assistant::{AssistantKind, ToolDefinition};
use crate::session::Disposition;

/// Request to start a conversation
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub assistant: AssistantKind,
}

/// A newly started conversation
#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub id: String,
    pub assistant: AssistantKind,
    /// System instructions for the language model
    pub instructions: String,
    /// Tools the language model may call
    pub tools: Vec<ToolDefinition>,
}

/// Current state of a conversation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub assistant: AssistantKind,
    pub form: Value,
    /// Fields the completion gate is still waiting for
    pub missing: Vec<&'static str>,
    /// A saved record has not been announced yet
    pub pending_announcement: bool,
}

/// Query for `DELETE /api/sessions/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct EndSessionQuery {
    #[serde(default)]
    pub disposition: Disposition,
}

/// A conversation that was ended
#[derive(Debug, Serialize)]
pub struct SessionEnded {
    pub id: String,
    /// Partial record, when it was persisted
    pub record: Option<Value>,
}

/// Result of an announcement retry
#[derive(Debug, Serialize)]
pub struct AnnounceResponse {
    /// Whether a pending announcement was delivered
    pub delivered: bool,
}

/// Build session router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(end_session))
        .route("/{id}/tools/{name}", post(call_tool))
        .route("/{id}/announce", post(announce))
        .with_state(state)
}

async fn create_session(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CreateSessionRequest>,
) -> (StatusCode, Json<SessionCreated>) {
    let assistant = state.factory.create(req.assistant).await;
    let instructions = assistant.instructions().to_string();
    let tools = assistant.tool_definitions();
    let id = state.sessions.insert(assistant).await;

    (
        StatusCode::CREATED,
        Json(SessionCreated {
            id,
            assistant: req.assistant,
            instructions,
            tools,
        }),
    )
}

async fn get_session(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let assistant = handle.lock().await;

    Ok(Json(SessionSnapshot {
        assistant: assistant.kind(),
        form: assistant.snapshot()?,
        missing: assistant.missing(),
        pending_announcement: assistant.has_pending_announcement(),
        id,
    }))
}

async fn call_tool(
    State(state): State<Arc<ApiState>>,
    Path((id, name)): Path<(String, String)>,
    arguments: String,
) -> Result<Response, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let result = handle.lock().await.execute(&name, &arguments).await;

    match result {
        Ok(body) => {
            tracing::debug!(session_id = %id, tool = %name, "tool executed");
            Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
        }
        Err(e) => {
            tracing::warn!(session_id = %id, tool = %name, error = %e, "tool call failed");
            Err(e.into())
        }
    }
}

async fn announce(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<AnnounceResponse>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let delivered = handle.lock().await.retry_announcement().await?;
    Ok(Json(AnnounceResponse { delivered }))
}

async fn end_session(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Query(query): Query<EndSessionQuery>,
) -> Result<Json<SessionEnded>, ApiError> {
    let handle = state.sessions.get(&id).await?;
    let record = handle.lock().await.end(query.disposition).await?;
    state.sessions.remove(&id).await?;

    Ok(Json(SessionEnded { id, record }))
}

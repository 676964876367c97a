//! Read access to persisted records

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use super::{ApiError, ApiState};
use crate::slots::{CheckInEntry, CoffeeOrder};

/// Build records router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/orders/latest", get(latest_order))
        .route("/api/checkins", get(list_checkins))
        .with_state(state)
}

/// Most recently completed coffee order
async fn latest_order(State(state): State<Arc<ApiState>>) -> Result<Json<CoffeeOrder>, ApiError> {
    state
        .factory
        .orders()
        .load()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("order".to_string()))
}

/// Full wellness history, oldest first
async fn list_checkins(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<CheckInEntry>>, ApiError> {
    Ok(Json(state.factory.checkins().load_all().await?))
}

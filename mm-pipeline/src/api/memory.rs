//! Memory (solved-problem history) handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{MemoryEntry, PipelineRun};
use crate::AppState;

/// GET /memory (newest first)
pub async fn list_entries(State(state): State<AppState>) -> Json<Vec<MemoryEntry>> {
    Json(state.orchestrator.memory_entries().await)
}

/// GET /memory/:id
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MemoryEntry>> {
    Ok(Json(state.orchestrator.memory_entry(id).await?))
}

/// POST /memory/:id/select
///
/// Loads the entry into the current run and returns the new snapshot.
pub async fn select_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineRun>> {
    state.orchestrator.select_memory_entry(id).await?;
    Ok(Json(state.orchestrator.snapshot().await))
}

/// DELETE /memory
pub async fn clear_entries(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.clear_memory().await;
    StatusCode::NO_CONTENT
}

pub fn memory_routes() -> Router<AppState> {
    Router::new()
        .route("/memory", get(list_entries).delete(clear_entries))
        .route("/memory/:id", get(get_entry))
        .route("/memory/:id/select", post(select_entry))
}

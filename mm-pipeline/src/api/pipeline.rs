//! Pipeline control handlers
//!
//! Submission handlers resolve once the orchestrator has finished with the
//! request and answer with the resulting snapshot; live stage progress is
//! available on `/events` in the meantime.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::gateways::MediaCapture;
use crate::models::{InputMode, MemoryEntry, PipelineRun};
use crate::orchestrator::HitlDecision;
use crate::AppState;

/// POST /pipeline/submit request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub input: String,
    #[serde(default)]
    pub mode: InputMode,
}

/// POST /pipeline/media request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequest {
    pub mode: InputMode,
    pub mime_type: String,
    /// Base64 payload, optionally as a `data:` URL
    pub data: String,
}

/// POST /pipeline/extraction/confirm request
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// POST /pipeline/hitl request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitlRequestBody {
    pub decision: Decision,
    #[serde(default)]
    pub corrected_content: Option<String>,
}

impl From<HitlRequestBody> for HitlDecision {
    fn from(body: HitlRequestBody) -> Self {
        match body.decision {
            Decision::Approve => HitlDecision::Approve {
                corrected_content: body.corrected_content,
            },
            Decision::Reject => HitlDecision::Reject,
        }
    }
}

/// POST /pipeline/feedback request
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub correct: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

/// GET /pipeline
pub async fn get_pipeline(State(state): State<AppState>) -> Json<PipelineRun> {
    Json(state.orchestrator.snapshot().await)
}

/// POST /pipeline/submit
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<Json<PipelineRun>> {
    state.orchestrator.submit(&request.input, request.mode).await?;
    Ok(Json(state.orchestrator.snapshot().await))
}

/// POST /pipeline/media
pub async fn submit_media(
    State(state): State<AppState>,
    Json(request): Json<MediaRequest>,
) -> ApiResult<Json<PipelineRun>> {
    let bytes = decode_payload(&request.data)?;
    let media = MediaCapture::new(bytes, request.mime_type);

    state.orchestrator.submit_media(media, request.mode).await?;
    Ok(Json(state.orchestrator.snapshot().await))
}

/// POST /pipeline/extraction/confirm
pub async fn confirm_extraction(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> ApiResult<Json<PipelineRun>> {
    state.orchestrator.confirm_extraction(&request.text).await?;
    Ok(Json(state.orchestrator.snapshot().await))
}

/// POST /pipeline/extraction/reject
pub async fn reject_extraction(State(state): State<AppState>) -> ApiResult<Json<PipelineRun>> {
    state.orchestrator.reject_extraction().await?;
    Ok(Json(state.orchestrator.snapshot().await))
}

/// POST /pipeline/hitl
pub async fn resolve_hitl(
    State(state): State<AppState>,
    Json(request): Json<HitlRequestBody>,
) -> ApiResult<Json<PipelineRun>> {
    state.orchestrator.resolve_hitl(request.into()).await?;
    Ok(Json(state.orchestrator.snapshot().await))
}

/// POST /pipeline/feedback
///
/// Answers `null` when there is no solved problem to record.
pub async fn record_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Json<Option<MemoryEntry>> {
    Json(
        state
            .orchestrator
            .record_feedback(request.correct, request.comment)
            .await,
    )
}

/// POST /pipeline/reset
pub async fn reset(State(state): State<AppState>) -> Json<PipelineRun> {
    state.orchestrator.reset().await;
    Json(state.orchestrator.snapshot().await)
}

/// Accept raw base64 or a `data:<mime>;base64,` URL
fn decode_payload(data: &str) -> ApiResult<Vec<u8>> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };

    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::BadRequest(format!("Media data is not valid base64: {}", e)))
}

pub fn pipeline_routes() -> Router<AppState> {
    Router::new()
        .route("/pipeline", get(get_pipeline))
        .route("/pipeline/submit", post(submit))
        .route("/pipeline/media", post(submit_media))
        .route("/pipeline/extraction/confirm", post(confirm_extraction))
        .route("/pipeline/extraction/reject", post(reject_extraction))
        .route("/pipeline/hitl", post(resolve_hitl))
        .route("/pipeline/feedback", post(record_feedback))
        .route("/pipeline/reset", post(reset))
}

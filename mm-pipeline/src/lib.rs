//! mm-pipeline library interface
//!
//! The agent pipeline orchestrator, its gateway adapters and the HTTP
//! surface that exposes it. The binary in `main.rs` wires these together;
//! integration tests use the same entry points.

pub mod api;
pub mod classifier;
pub mod error;
pub mod gateways;
pub mod memory;
pub mod models;
pub mod orchestrator;

pub use crate::error::{ApiError, ApiResult};
pub use crate::orchestrator::{
    Gateways, HitlDecision, PipelineError, PipelineOrchestrator, PipelineSettings,
};

use axum::Router;
use chrono::{DateTime, Utc};
use mm_common::events::EventBus;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: PipelineOrchestrator,
    /// Same bus the orchestrator publishes on
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: PipelineOrchestrator) -> Self {
        Self {
            event_bus: orchestrator.event_bus().clone(),
            orchestrator,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::pipeline_routes())
        .merge(api::memory_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

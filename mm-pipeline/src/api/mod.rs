//! HTTP API handlers for mm-pipeline
//!
//! REST routes drive the orchestrator; `/events` streams its progress.

pub mod health;
pub mod memory;
pub mod pipeline;
pub mod sse;

pub use health::health_routes;
pub use memory::memory_routes;
pub use pipeline::pipeline_routes;
pub use sse::event_stream;

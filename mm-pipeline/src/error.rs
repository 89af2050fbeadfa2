//! Error types for mm-pipeline HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::orchestrator::PipelineError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Orchestrator precondition violation
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Pipeline(err) => {
                let status = match err {
                    PipelineError::Busy
                    | PipelineError::ReviewPending
                    | PipelineError::NoPendingReview => StatusCode::CONFLICT,
                    PipelineError::EmptyInput | PipelineError::InvalidInput(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
                };
                (status, err.code(), err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        tracing::debug!(status = status.as_u16(), code = error_code, "Request rejected: {}", message);

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_pipeline_errors_map_to_status() {
        let cases = [
            (PipelineError::Busy, StatusCode::CONFLICT, "BUSY"),
            (PipelineError::ReviewPending, StatusCode::CONFLICT, "REVIEW_PENDING"),
            (PipelineError::NoPendingReview, StatusCode::CONFLICT, "NO_PENDING_REVIEW"),
            (PipelineError::EmptyInput, StatusCode::BAD_REQUEST, "EMPTY_INPUT"),
            (
                PipelineError::InvalidInput("bad".into()),
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
            ),
            (PipelineError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND, "NOT_FOUND"),
        ];

        for (err, status, code) in cases {
            let (got_status, got_code, _) = ApiError::from(err).parts();
            assert_eq!(got_status, status);
            assert_eq!(got_code, code);
        }
    }
}

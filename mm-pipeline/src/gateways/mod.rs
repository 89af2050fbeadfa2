//! External service gateways
//!
//! The orchestrator only sees the [`RecognitionGateway`] and
//! [`SolvingGateway`] traits. The HTTP adapters in this module implement them
//! against the hosted recognition and solver functions; tests substitute
//! in-process fakes.

pub mod asr_client;
pub mod http_client;
pub mod notation;
pub mod ocr_client;
pub mod solver_client;

pub use asr_client::AsrClient;
pub use http_client::GatewayHttp;
pub use ocr_client::OcrClient;
pub use solver_client::SolverClient;

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;

use crate::models::{Solution, Topic};

/// Gateway failures, normalized across all adapters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Usage credits exhausted")]
    QuotaExhausted,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Service unreachable: {0}")]
    Unreachable(String),

    #[error("Upstream error ({status:?}): {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
}

impl GatewayError {
    /// Failure kind for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::RateLimited => "rate-limit",
            GatewayError::QuotaExhausted => "quota",
            GatewayError::MalformedResponse(_) => "malformed-response",
            GatewayError::Unreachable(_) => "unreachable",
            GatewayError::Upstream { .. } => "upstream",
        }
    }

    /// Message worth showing to the user, when there is one
    ///
    /// Malformed and unreachable failures return None so the caller falls
    /// back to its generic notification text.
    pub fn user_message(&self) -> Option<String> {
        match self {
            GatewayError::RateLimited => {
                Some("Rate limit exceeded. Please try again in a moment.".to_string())
            }
            GatewayError::QuotaExhausted => {
                Some("AI credits exhausted. Please add funds to continue.".to_string())
            }
            GatewayError::Upstream { message, .. } if !message.trim().is_empty() => {
                Some(message.clone())
            }
            _ => None,
        }
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Captured image or audio handed to a recognition gateway
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCapture {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl MediaCapture {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Recognized text with its confidence in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub text: String,
    pub confidence: f64,
}

/// Image-to-text or audio-to-text service
#[async_trait]
pub trait RecognitionGateway: Send + Sync {
    /// Short name used in logs ("ocr", "asr")
    fn name(&self) -> &'static str;

    async fn recognize(&self, media: &MediaCapture) -> GatewayResult<Extraction>;
}

/// Step-by-step math solver
#[async_trait]
pub trait SolvingGateway: Send + Sync {
    async fn solve(&self, problem_text: &str, topic: Topic) -> GatewayResult<Solution>;
}

//! Audio-to-text gateway client (`asr-transcribe` function)
//!
//! Transcripts pass through the spoken-math rewriter before they reach the
//! orchestrator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::notation::rewrite_spoken_math;
use super::{Extraction, GatewayError, GatewayHttp, GatewayResult, MediaCapture, RecognitionGateway};

const FUNCTION: &str = "asr-transcribe";
const DEFAULT_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AsrRequest<'a> {
    audio_data: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAsrResponse {
    #[serde(default)]
    extracted_text: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct AsrClient {
    http: GatewayHttp,
}

impl AsrClient {
    pub fn new(http: GatewayHttp) -> Self {
        Self { http }
    }
}

#[async_trait]
impl RecognitionGateway for AsrClient {
    fn name(&self) -> &'static str {
        "asr"
    }

    async fn recognize(&self, media: &MediaCapture) -> GatewayResult<Extraction> {
        let data_url = media.to_data_url();
        let raw: RawAsrResponse = self
            .http
            .invoke(FUNCTION, &AsrRequest { audio_data: &data_url })
            .await?;

        let extraction = normalize(raw)?;
        tracing::info!(
            confidence = extraction.confidence,
            chars = extraction.text.chars().count(),
            "ASR transcription received"
        );
        Ok(extraction)
    }
}

fn normalize(raw: RawAsrResponse) -> GatewayResult<Extraction> {
    let transcript = raw.extracted_text.unwrap_or_default();
    let text = rewrite_spoken_math(transcript.trim());
    if text.is_empty() {
        return Err(GatewayError::MalformedResponse(
            "asr-transcribe returned no text".to_string(),
        ));
    }

    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    Ok(Extraction { text, confidence })
}

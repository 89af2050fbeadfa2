//! Image-to-text gateway client (`ocr-extract` function)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Extraction, GatewayError, GatewayHttp, GatewayResult, MediaCapture, RecognitionGateway};

const FUNCTION: &str = "ocr-extract";

/// Marker the recognizer leaves around characters it could not read
const UNCERTAIN_MARKER: &str = "[?]";
const UNCERTAIN_CONFIDENCE: f64 = 0.6;
const CLEAN_CONFIDENCE: f64 = 0.92;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OcrRequest<'a> {
    image_data: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOcrResponse {
    #[serde(default)]
    extracted_text: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct OcrClient {
    http: GatewayHttp,
}

impl OcrClient {
    pub fn new(http: GatewayHttp) -> Self {
        Self { http }
    }
}

#[async_trait]
impl RecognitionGateway for OcrClient {
    fn name(&self) -> &'static str {
        "ocr"
    }

    async fn recognize(&self, media: &MediaCapture) -> GatewayResult<Extraction> {
        let data_url = media.to_data_url();
        let raw: RawOcrResponse = self
            .http
            .invoke(FUNCTION, &OcrRequest { image_data: &data_url })
            .await?;

        let extraction = normalize(raw)?;
        tracing::info!(
            confidence = extraction.confidence,
            chars = extraction.text.chars().count(),
            "OCR extraction received"
        );
        Ok(extraction)
    }
}

fn normalize(raw: RawOcrResponse) -> GatewayResult<Extraction> {
    let text = raw.extracted_text.unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return Err(GatewayError::MalformedResponse(
            "ocr-extract returned no text".to_string(),
        ));
    }

    let confidence = match raw.confidence {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ if text.contains(UNCERTAIN_MARKER) => UNCERTAIN_CONFIDENCE,
        _ => CLEAN_CONFIDENCE,
    };

    Ok(Extraction { text, confidence })
}

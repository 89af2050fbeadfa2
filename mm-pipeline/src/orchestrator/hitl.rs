//! Human-in-the-loop gate
//!
//! Decides when a recognition result must be reviewed by a person and builds
//! the review request. Resolution is handled by the orchestrator.

use mm_common::events::{HitlKind, HitlRequest, InputMode};

/// Default confidence below which an extraction is held for review
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// A human's answer to a pending review
#[derive(Debug, Clone, PartialEq)]
pub enum HitlDecision {
    Approve { corrected_content: Option<String> },
    Reject,
}

impl HitlDecision {
    pub fn approve() -> Self {
        HitlDecision::Approve {
            corrected_content: None,
        }
    }

    pub fn approve_with(corrected: impl Into<String>) -> Self {
        HitlDecision::Approve {
            corrected_content: Some(corrected.into()),
        }
    }
}

/// Strictly below the threshold needs review
pub fn needs_review(confidence: f64, threshold: f64) -> bool {
    confidence < threshold
}

/// Review request for a low-confidence extraction (None for text mode)
pub fn correction_request(mode: InputMode, extracted_text: &str) -> Option<HitlRequest> {
    let kind = HitlKind::correction_for(mode)?;
    let message = match kind {
        HitlKind::OcrCorrection => {
            "The OCR confidence is low. Please review and correct the extracted text."
        }
        _ => "The transcription confidence is low. Please review and correct the transcribed text.",
    };
    Some(HitlRequest::new(kind, extracted_text.to_string(), message))
}

/// Text to submit on approval: non-blank correction, else the original
pub fn approved_content(corrected: Option<&str>, original: &str) -> String {
    corrected
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(original)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        assert!(needs_review(0.69, DEFAULT_CONFIDENCE_THRESHOLD));
        assert!(!needs_review(0.7, DEFAULT_CONFIDENCE_THRESHOLD));
        assert!(!needs_review(0.92, DEFAULT_CONFIDENCE_THRESHOLD));
    }

    #[test]
    fn test_request_kind_follows_mode() {
        let image = correction_request(InputMode::Image, "x + [?] = 3").unwrap();
        assert_eq!(image.kind, HitlKind::OcrCorrection);
        assert_eq!(image.original_content, "x + [?] = 3");
        assert!(image.message.contains("OCR confidence is low"));

        let audio = correction_request(InputMode::Audio, "solve for why").unwrap();
        assert_eq!(audio.kind, HitlKind::AsrCorrection);

        assert!(correction_request(InputMode::Text, "2 + 2").is_none());
    }

    #[test]
    fn test_approved_content_prefers_non_blank_correction() {
        assert_eq!(approved_content(Some("x + 1 = 3"), "x + [?] = 3"), "x + 1 = 3");
        assert_eq!(approved_content(Some("  "), "x + [?] = 3"), "x + [?] = 3");
        assert_eq!(approved_content(None, "x + [?] = 3"), "x + [?] = 3");
    }
}

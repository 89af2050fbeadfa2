//! Human review (HITL) type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pipeline_types::InputMode;

/// Why the pipeline paused for a human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HitlKind {
    OcrCorrection,
    AsrCorrection,
    Clarification,
    Verification,
}

impl HitlKind {
    /// Correction kind for a low-confidence extraction of the given mode
    pub fn correction_for(mode: InputMode) -> Option<Self> {
        match mode {
            InputMode::Image => Some(HitlKind::OcrCorrection),
            InputMode::Audio => Some(HitlKind::AsrCorrection),
            InputMode::Text => None,
        }
    }
}

/// A paused-pipeline checkpoint awaiting a human decision
///
/// Never mutated once created: resolving it discards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitlRequest {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: HitlKind,
    pub original_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_content: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl HitlRequest {
    pub fn new(kind: HitlKind, original_content: String, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            original_content,
            suggested_content: None,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_kind_per_mode() {
        assert_eq!(HitlKind::correction_for(InputMode::Image), Some(HitlKind::OcrCorrection));
        assert_eq!(HitlKind::correction_for(InputMode::Audio), Some(HitlKind::AsrCorrection));
        assert_eq!(HitlKind::correction_for(InputMode::Text), None);
    }

    #[test]
    fn test_request_serializes_kebab_kind() {
        let request = HitlRequest::new(
            HitlKind::OcrCorrection,
            "x + 1 = [?]".to_string(),
            "Please review",
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "ocr-correction");
        assert_eq!(json["originalContent"], "x + 1 = [?]");
        assert!(json.get("suggestedContent").is_none());
    }
}

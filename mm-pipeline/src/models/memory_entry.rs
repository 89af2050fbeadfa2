use chrono::{DateTime, Utc};
use mm_common::events::InputMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ParsedProblem, Solution};

/// Immutable record of one feedback-confirmed solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub input_mode: InputMode,
    pub original_input: String,
    #[serde(rename = "parsedProblem")]
    pub problem: ParsedProblem,
    pub solution: Solution,
    pub was_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
}

impl MemoryEntry {
    pub fn new(
        input_mode: InputMode,
        original_input: String,
        problem: ParsedProblem,
        solution: Solution,
        was_correct: bool,
        user_feedback: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            input_mode,
            original_input,
            problem,
            solution,
            was_correct,
            user_feedback,
        }
    }
}

//! Structured solution returned by the solving gateway

use mm_common::events::VerificationStatus;
use serde::{Deserialize, Serialize};

/// One numbered step of a worked solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionStep {
    pub step_number: u32,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Well-formed solution (all defaults already applied)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub steps: Vec<SolutionStep>,
    pub final_answer: String,
    /// [0.0, 1.0]
    pub confidence: f64,
    pub verification_status: VerificationStatus,
    pub explanation: String,
    pub retrieved_context: Vec<String>,
}

impl Solution {
    /// Short verify-stage message for the solver's verification outcome
    pub fn verification_message(&self) -> &'static str {
        match self.verification_status {
            VerificationStatus::Verified => "Solution verified",
            VerificationStatus::Uncertain => "Solution could not be fully verified",
            VerificationStatus::Failed => "Verification failed, review the steps carefully",
        }
    }
}

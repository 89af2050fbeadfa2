//! Solving gateway client (`math-solver` function)
//!
//! The solver's payload is loosely shaped, so it is read into a raw schema
//! and default-filled once here. Everything past this module handles a
//! complete [`Solution`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GatewayError, GatewayHttp, GatewayResult, SolvingGateway};
use crate::models::{Solution, SolutionStep, Topic, VerificationStatus};

const FUNCTION: &str = "math-solver";

const DEFAULT_CONFIDENCE: f64 = 0.85;
const DEFAULT_FINAL_ANSWER: &str = "See steps above";
const DEFAULT_EXPLANATION: &str = "Solution provided by AI.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveRequest<'a> {
    problem_text: &'a str,
    topic: Topic,
}

/// Solver payload as received; every field may be missing or mistyped
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSolution {
    steps: Value,
    final_answer: Value,
    confidence: Value,
    verification_status: Value,
    explanation: Value,
    retrieved_context: Value,
}

pub struct SolverClient {
    http: GatewayHttp,
}

impl SolverClient {
    pub fn new(http: GatewayHttp) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SolvingGateway for SolverClient {
    async fn solve(&self, problem_text: &str, topic: Topic) -> GatewayResult<Solution> {
        let raw: RawSolution = self
            .http
            .invoke(FUNCTION, &SolveRequest { problem_text, topic })
            .await?;

        let solution = raw.into_solution()?;
        tracing::info!(
            topic = %topic,
            steps = solution.steps.len(),
            confidence = solution.confidence,
            verification = ?solution.verification_status,
            "Solution received"
        );
        Ok(solution)
    }
}

impl RawSolution {
    /// Apply defaults; fails only when there is nothing to show at all
    pub fn into_solution(self) -> GatewayResult<Solution> {
        let steps = read_steps(&self.steps);
        let final_answer = non_blank(&self.final_answer);

        if steps.is_empty() && final_answer.is_none() {
            return Err(GatewayError::MalformedResponse(
                "math-solver returned neither steps nor a final answer".to_string(),
            ));
        }

        let confidence = self
            .confidence
            .as_f64()
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_CONFIDENCE);

        let verification_status = self
            .verification_status
            .as_str()
            .and_then(VerificationStatus::from_wire)
            .unwrap_or_default();

        let retrieved_context = match &self.retrieved_context {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Ok(Solution {
            steps,
            final_answer: final_answer.unwrap_or_else(|| DEFAULT_FINAL_ANSWER.to_string()),
            confidence,
            verification_status,
            explanation: non_blank(&self.explanation)
                .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string()),
            retrieved_context,
        })
    }
}

/// Readable step objects; missing step numbers follow position
fn read_steps(value: &Value) -> Vec<SolutionStep> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let description = non_blank(item.get("description")?)?;
            Some((item, description))
        })
        .enumerate()
        .map(|(position, (item, description))| SolutionStep {
            step_number: item
                .get("stepNumber")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(position as u32 + 1),
            description,
            formula: item.get("formula").and_then(non_blank),
            result: item.get("result").and_then(non_blank),
        })
        .collect()
}

fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> GatewayResult<Solution> {
        serde_json::from_value::<RawSolution>(value).unwrap().into_solution()
    }

    #[test]
    fn test_defaults_filled() {
        let solution = parse(json!({
            "steps": "not a list",
            "finalAnswer": "x = 2",
            "retrievedContext": {"oops": true}
        }))
        .unwrap();

        assert!(solution.steps.is_empty());
        assert!(solution.retrieved_context.is_empty());
        assert_eq!(solution.confidence, 0.85);
        assert_eq!(solution.verification_status, VerificationStatus::Uncertain);
        assert_eq!(solution.explanation, "Solution provided by AI.");
    }

    #[test]
    fn test_blank_final_answer_defaults_when_steps_present() {
        let solution = parse(json!({
            "steps": [{"stepNumber": 1, "description": "Isolate x"}],
            "finalAnswer": "  ",
            "confidence": 0.97,
            "verificationStatus": "verified"
        }))
        .unwrap();

        assert_eq!(solution.final_answer, "See steps above");
        assert_eq!(solution.confidence, 0.97);
        assert_eq!(solution.verification_status, VerificationStatus::Verified);
    }

    #[test]
    fn test_unreadable_steps_skipped_and_numbered() {
        let solution = parse(json!({
            "steps": [
                {"description": "Apply the power rule", "formula": "d/dx x^n = n x^(n-1)"},
                42,
                {"formula": "orphan"},
                {"description": "Combine terms", "result": "3x² + 4x - 5"}
            ],
            "finalAnswer": "f'(x) = 3x² + 4x - 5"
        }))
        .unwrap();

        assert_eq!(solution.steps.len(), 2);
        assert_eq!(solution.steps[0].step_number, 1);
        assert_eq!(solution.steps[1].step_number, 2);
        assert_eq!(solution.steps[1].result.as_deref(), Some("3x² + 4x - 5"));
        assert!(solution.steps[0].result.is_none());
    }

    #[test]
    fn test_unknown_verification_status_is_uncertain() {
        let solution = parse(json!({"finalAnswer": "4", "verificationStatus": "maybe"})).unwrap();
        assert_eq!(solution.verification_status, VerificationStatus::Uncertain);
    }

    #[test]
    fn test_empty_payload_is_malformed() {
        assert!(matches!(parse(json!({})), Err(GatewayError::MalformedResponse(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(SolveRequest {
            problem_text: "Solve x + 1 = 2",
            topic: Topic::LinearAlgebra,
        })
        .unwrap();
        assert_eq!(body, json!({"problemText": "Solve x + 1 = 2", "topic": "linear-algebra"}));
    }
}

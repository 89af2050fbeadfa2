//! Classifier output types

use serde::{Deserialize, Serialize};

/// Topic category used to route a problem to the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Algebra,
    Probability,
    Calculus,
    LinearAlgebra,
    Unknown,
}

impl Topic {
    /// Wire/display name (matches the serde representation)
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Algebra => "algebra",
            Topic::Probability => "probability",
            Topic::Calculus => "calculus",
            Topic::LinearAlgebra => "linear-algebra",
            Topic::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured form of the submitted problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedProblem {
    pub problem_text: String,
    pub topic: Topic,
    pub variables: Vec<String>,
    pub constraints: Vec<String>,
    /// Reserved: no code path sets this yet
    pub needs_clarification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification_reason: Option<String>,
}

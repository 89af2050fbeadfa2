//! Pipeline stage type definitions
//!
//! Supporting types for agent pipeline progress tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the problem was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    #[default]
    Text,
    Image,
    Audio,
}

impl InputMode {
    /// Whether this mode needs a recognition pass before solving
    pub fn needs_recognition(self) -> bool {
        !matches!(self, InputMode::Text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::Text => "text",
            InputMode::Image => "image",
            InputMode::Audio => "audio",
        }
    }
}

/// The five fixed pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    Parse,
    Route,
    Solve,
    Verify,
    Explain,
}

impl AgentKind {
    /// All stages in execution order
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Parse,
        AgentKind::Route,
        AgentKind::Solve,
        AgentKind::Verify,
        AgentKind::Explain,
    ];

    /// Position of this stage in the pipeline (0-based)
    pub fn index(self) -> usize {
        match self {
            AgentKind::Parse => 0,
            AgentKind::Route => 1,
            AgentKind::Solve => 2,
            AgentKind::Verify => 3,
            AgentKind::Explain => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Parse => "parse",
            AgentKind::Route => "route",
            AgentKind::Solve => "solve",
            AgentKind::Verify => "verify",
            AgentKind::Explain => "explain",
        }
    }
}

/// Status of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
    WaitingHitl,
}

/// Live status record of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    #[serde(rename = "type")]
    pub agent: AgentKind,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl AgentState {
    pub fn idle(agent: AgentKind) -> Self {
        Self {
            agent,
            status: AgentStatus::Idle,
            message: None,
            start_time: None,
            end_time: None,
        }
    }

    /// Fresh set of five idle stages in pipeline order
    pub fn initial_set() -> Vec<AgentState> {
        AgentKind::ALL.iter().map(|&kind| AgentState::idle(kind)).collect()
    }

    /// idle → running
    pub fn start(&mut self, message: impl Into<String>, at: DateTime<Utc>) {
        self.status = AgentStatus::Running;
        self.message = Some(message.into());
        self.start_time = Some(at);
        self.end_time = None;
    }

    /// Update the activity message of a running stage
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// running → completed
    pub fn complete(&mut self, message: impl Into<String>, at: DateTime<Utc>) {
        self.status = AgentStatus::Completed;
        self.message = Some(message.into());
        self.end_time = Some(at);
    }

    /// running → error
    pub fn fail(&mut self, message: impl Into<String>, at: DateTime<Utc>) {
        self.status = AgentStatus::Error;
        self.message = Some(message.into());
        self.end_time = Some(at);
    }

    /// idle → waiting-hitl (entered instead of running)
    pub fn wait_for_review(&mut self, message: impl Into<String>) {
        self.status = AgentStatus::WaitingHitl;
        self.message = Some(message.into());
        self.start_time = None;
        self.end_time = None;
    }

    /// Running interval in milliseconds, once the stage has ended
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(crate::time::elapsed_ms(start, end)),
            _ => None,
        }
    }
}

/// Outcome of the external solver's own verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    Verified,
    #[default]
    Uncertain,
    Failed,
}

impl VerificationStatus {
    /// Parse the wire value; anything unrecognized is `None`
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "verified" => Some(Self::Verified),
            "uncertain" => Some(Self::Uncertain),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

//! Pipeline run state
//!
//! One `PipelineRun` is one attempt to solve one problem. Fields are filled
//! monotonically by the stage that produces them; a new submission or a reset
//! replaces the whole value rather than editing it.

use mm_common::events::{AgentKind, AgentState, AgentStatus, HitlRequest, InputMode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ParsedProblem, Solution};

/// What the user originally handed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RawInput {
    Text { text: String },
    /// Captured media; only a reference is kept, never the bytes
    #[serde(rename_all = "camelCase")]
    Media { mime_type: String, byte_len: usize },
}

/// Current pipeline state (snapshot shape served to observers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    /// None in the cleared state
    pub run_id: Option<Uuid>,
    pub input_mode: InputMode,
    pub raw_input: Option<RawInput>,
    /// Text that entered the classifier (what memory records as the input)
    pub submitted_text: Option<String>,
    pub extracted_text: Option<String>,
    pub extraction_confidence: Option<f64>,
    pub problem: Option<ParsedProblem>,
    pub solution: Option<Solution>,
    pub agents: Vec<AgentState>,
    pub hitl_request: Option<HitlRequest>,
    pub is_processing: bool,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::cleared()
    }
}

impl PipelineRun {
    /// Input-ready state with nothing in flight
    pub fn cleared() -> Self {
        Self {
            run_id: None,
            input_mode: InputMode::Text,
            raw_input: None,
            submitted_text: None,
            extracted_text: None,
            extraction_confidence: None,
            problem: None,
            solution: None,
            agents: AgentState::initial_set(),
            hitl_request: None,
            is_processing: false,
        }
    }

    /// Fresh run for a solve attempt on `text`
    ///
    /// For text mode the raw input is the text itself. For image/audio the
    /// caller carries over the media reference and confidence of the
    /// extraction being confirmed.
    pub fn begin_solve(
        mode: InputMode,
        text: String,
        carried_media: Option<(RawInput, Option<f64>)>,
    ) -> Self {
        let (raw_input, extraction_confidence) = match (mode, carried_media) {
            (InputMode::Text, _) => (RawInput::Text { text: text.clone() }, None),
            (_, Some((media, confidence))) => (media, confidence),
            (_, None) => (RawInput::Text { text: text.clone() }, None),
        };

        Self {
            run_id: Some(Uuid::new_v4()),
            input_mode: mode,
            raw_input: Some(raw_input),
            submitted_text: Some(text.clone()),
            extracted_text: Some(text),
            extraction_confidence,
            is_processing: true,
            ..Self::cleared()
        }
    }

    /// Fresh run for a recognition pass over captured media
    pub fn begin_recognition(mode: InputMode, mime_type: String, byte_len: usize) -> Self {
        Self {
            run_id: Some(Uuid::new_v4()),
            input_mode: mode,
            raw_input: Some(RawInput::Media {
                mime_type,
                byte_len,
            }),
            is_processing: true,
            ..Self::cleared()
        }
    }

    pub fn agent(&self, kind: AgentKind) -> &AgentState {
        &self.agents[kind.index()]
    }

    pub fn agent_mut(&mut self, kind: AgentKind) -> &mut AgentState {
        &mut self.agents[kind.index()]
    }

    /// Number of stages currently running (0 or 1 when invariants hold)
    pub fn running_count(&self) -> usize {
        self.agents
            .iter()
            .filter(|a| a.status == AgentStatus::Running)
            .count()
    }

    /// True when no stage has completed ahead of an unfinished predecessor
    pub fn stage_order_holds(&self) -> bool {
        let mut seen_unfinished = false;
        for agent in &self.agents {
            match agent.status {
                AgentStatus::Completed if seen_unfinished => return false,
                AgentStatus::Completed => {}
                _ => seen_unfinished = true,
            }
        }
        true
    }

    /// Media reference and confidence to carry into a confirming solve run
    pub fn media_carry_over(&self) -> Option<(RawInput, Option<f64>)> {
        match &self.raw_input {
            Some(media @ RawInput::Media { .. }) => {
                Some((media.clone(), self.extraction_confidence))
            }
            _ => None,
        }
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::cleared()
    }
}

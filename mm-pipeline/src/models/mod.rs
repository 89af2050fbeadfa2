//! Pipeline data model
//!
//! Stage and review types are shared with the event system and live in
//! `mm_common::events`; they are re-exported here for convenience.

pub mod memory_entry;
pub mod pipeline_run;
pub mod problem;
pub mod solution;

pub use memory_entry::MemoryEntry;
pub use mm_common::events::{
    AgentKind, AgentState, AgentStatus, HitlKind, HitlRequest, InputMode, VerificationStatus,
};
pub use pipeline_run::{PipelineRun, RawInput};
pub use problem::{ParsedProblem, Topic};
pub use solution::{Solution, SolutionStep};

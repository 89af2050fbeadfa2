//! Agent pipeline orchestrator
//!
//! Owns the single active [`PipelineRun`] and the [`MemoryStore`], drives the
//! five stages in order and publishes every state change on the
//! [`EventBus`].
//!
//! Stage progression:
//! PARSE → ROUTE → SOLVE → VERIFY → EXPLAIN
//!
//! Image and audio input first pass through a recognition gateway. The
//! result is either offered as a preview to confirm or, below the confidence
//! threshold, held behind a human review request. Nothing recognized is ever
//! submitted automatically.

pub mod hitl;
mod run;

pub use hitl::HitlDecision;

use std::sync::Arc;

use chrono::Utc;
use mm_common::config::PipelineConfig;
use mm_common::events::{EventBus, MentorEvent, NotificationLevel};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use crate::gateways::{MediaCapture, RecognitionGateway, SolvingGateway};
use crate::memory::MemoryStore;
use crate::models::{AgentState, InputMode, MemoryEntry, PipelineRun};

/// Operation precondition violations
///
/// Gateway failures are not errors of the operations: they end up in the
/// stage states and notifications instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("A problem is already being processed")]
    Busy,

    #[error("A review request is pending; approve or reject it first")]
    ReviewPending,

    #[error("No review request is pending")]
    NoPendingReview,

    #[error("Input is empty")]
    EmptyInput,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Memory entry not found: {0}")]
    NotFound(Uuid),
}

impl PipelineError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Busy => "BUSY",
            PipelineError::ReviewPending => "REVIEW_PENDING",
            PipelineError::NoPendingReview => "NO_PENDING_REVIEW",
            PipelineError::EmptyInput => "EMPTY_INPUT",
            PipelineError::InvalidInput(_) => "INVALID_INPUT",
            PipelineError::NotFound(_) => "NOT_FOUND",
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// The three external services the pipeline depends on
#[derive(Clone)]
pub struct Gateways {
    pub ocr: Arc<dyn RecognitionGateway>,
    pub asr: Arc<dyn RecognitionGateway>,
    pub solver: Arc<dyn SolvingGateway>,
}

/// Tunables taken from the `[pipeline]` config section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub hitl_confidence_threshold: f64,
    pub memory_capacity: Option<usize>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            hitl_confidence_threshold: hitl::DEFAULT_CONFIDENCE_THRESHOLD,
            memory_capacity: None,
        }
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            hitl_confidence_threshold: config.hitl_confidence_threshold,
            memory_capacity: config.memory_capacity,
        }
    }
}

/// Run state plus the generation that owns it
///
/// Every operation that starts or discards a run bumps `generation`; an
/// in-flight run only writes while its generation is still current.
struct RunSlot {
    run: PipelineRun,
    generation: u64,
}

/// Pipeline orchestrator service
#[derive(Clone)]
pub struct PipelineOrchestrator {
    slot: Arc<Mutex<RunSlot>>,
    memory: Arc<RwLock<MemoryStore>>,
    gateways: Gateways,
    event_bus: EventBus,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    pub fn new(gateways: Gateways, event_bus: EventBus, settings: PipelineSettings) -> Self {
        tracing::info!(
            hitl_threshold = settings.hitl_confidence_threshold,
            memory_capacity = ?settings.memory_capacity,
            "Pipeline orchestrator initialized"
        );

        Self {
            slot: Arc::new(Mutex::new(RunSlot {
                run: PipelineRun::cleared(),
                generation: 0,
            })),
            memory: Arc::new(RwLock::new(MemoryStore::with_capacity(
                settings.memory_capacity,
            ))),
            gateways,
            event_bus,
            settings,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Observer interface: every state change after this call
    pub fn subscribe(&self) -> broadcast::Receiver<MentorEvent> {
        self.event_bus.subscribe()
    }

    /// Copy of the current run
    pub async fn snapshot(&self) -> PipelineRun {
        self.slot.lock().await.run.clone()
    }

    // ========================================
    // Submission
    // ========================================

    /// Run the five stages over `input`
    ///
    /// Used for typed text and for confirmed or corrected extractions. When
    /// `mode` is image/audio the new run keeps the media reference and
    /// confidence of the extraction it confirms. Resolves once the run has
    /// finished, failed or been abandoned. The stages run on their own task,
    /// so dropping the returned future does not stop the run.
    pub async fn submit(&self, input: &str, mode: InputMode) -> PipelineResult<()> {
        if input.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let (generation, run_id) = {
            let mut slot = self.slot.lock().await;
            if slot.run.is_processing {
                return Err(PipelineError::Busy);
            }
            self.start_solve_run(&mut slot, input, mode)
        };

        tracing::info!(run_id = %run_id, mode = mode.as_str(), "Pipeline run started");

        self.drive_solve(generation, run_id, input.to_string()).await;
        Ok(())
    }

    /// Replace the run with a fresh solve run (slot lock held by the caller)
    fn start_solve_run(&self, slot: &mut RunSlot, input: &str, mode: InputMode) -> (u64, Uuid) {
        let carried = if mode.needs_recognition() {
            slot.run.media_carry_over()
        } else {
            None
        };

        slot.generation += 1;
        slot.run = PipelineRun::begin_solve(mode, input.to_string(), carried);
        let run_id = slot.run.run_id.unwrap_or_else(Uuid::new_v4);

        self.event_bus.emit_lossy(MentorEvent::RunStarted {
            run_id,
            input_mode: mode,
            timestamp: Utc::now(),
        });
        (slot.generation, run_id)
    }

    /// Recognize captured media and stage the text for human confirmation
    pub async fn submit_media(&self, media: MediaCapture, mode: InputMode) -> PipelineResult<()> {
        if !mode.needs_recognition() {
            return Err(PipelineError::InvalidInput(
                "media submission requires image or audio mode".to_string(),
            ));
        }
        if media.is_empty() {
            return Err(PipelineError::InvalidInput("media payload is empty".to_string()));
        }

        let (generation, run_id) = {
            let mut slot = self.slot.lock().await;
            if slot.run.is_processing {
                return Err(PipelineError::Busy);
            }
            if slot.run.hitl_request.is_some() {
                return Err(PipelineError::ReviewPending);
            }

            slot.generation += 1;
            slot.run =
                PipelineRun::begin_recognition(mode, media.mime_type.clone(), media.bytes.len());
            let run_id = slot.run.run_id.unwrap_or_else(Uuid::new_v4);

            self.event_bus.emit_lossy(MentorEvent::RunStarted {
                run_id,
                input_mode: mode,
                timestamp: Utc::now(),
            });
            (slot.generation, run_id)
        };

        tracing::info!(
            run_id = %run_id,
            mode = mode.as_str(),
            mime_type = %media.mime_type,
            bytes = media.bytes.len(),
            "Recognition started"
        );

        self.drive_recognition(generation, run_id, media, mode).await;
        Ok(())
    }

    /// Solve the (possibly edited) extraction preview
    pub async fn confirm_extraction(&self, text: &str) -> PipelineResult<()> {
        let mode = self.slot.lock().await.run.input_mode;
        self.submit(text, mode).await
    }

    /// Discard the extraction preview
    pub async fn reject_extraction(&self) -> PipelineResult<()> {
        let mut slot = self.slot.lock().await;
        if slot.run.is_processing {
            return Err(PipelineError::Busy);
        }
        if slot.run.hitl_request.is_some() {
            return Err(PipelineError::ReviewPending);
        }
        slot.run.extracted_text = None;
        Ok(())
    }

    // ========================================
    // Human review
    // ========================================

    /// Approve or reject the pending review request
    ///
    /// Approval submits the corrected content (or the original when no
    /// usable correction is given) and resolves when that run ends. The
    /// request stays pending when the approval is refused.
    pub async fn resolve_hitl(&self, decision: HitlDecision) -> PipelineResult<()> {
        let mut slot = self.slot.lock().await;
        if slot.run.is_processing {
            return Err(PipelineError::Busy);
        }
        let request = slot
            .run
            .hitl_request
            .clone()
            .ok_or(PipelineError::NoPendingReview)?;

        match decision {
            HitlDecision::Approve { corrected_content } => {
                let content =
                    hitl::approved_content(corrected_content.as_deref(), &request.original_content);
                if content.trim().is_empty() {
                    return Err(PipelineError::EmptyInput);
                }

                self.event_bus.emit_lossy(MentorEvent::HitlResolved {
                    request_id: request.id,
                    approved: true,
                    timestamp: Utc::now(),
                });
                let mode = slot.run.input_mode;
                let (generation, run_id) = self.start_solve_run(&mut slot, &content, mode);
                drop(slot);

                tracing::info!(
                    request_id = %request.id,
                    run_id = %run_id,
                    corrected = content != request.original_content,
                    "Review approved"
                );

                self.drive_solve(generation, run_id, content).await;
                Ok(())
            }
            HitlDecision::Reject => {
                slot.run.hitl_request = None;
                slot.run.extracted_text = None;
                slot.run.agents = AgentState::initial_set();

                self.event_bus.emit_lossy(MentorEvent::HitlResolved {
                    request_id: request.id,
                    approved: false,
                    timestamp: Utc::now(),
                });
                self.event_bus.emit_lossy(MentorEvent::notification(
                    NotificationLevel::Info,
                    "Input rejected",
                    "Please try again with a clearer input.",
                ));
                drop(slot);

                tracing::info!(request_id = %request.id, "Review rejected");
                Ok(())
            }
        }
    }

    // ========================================
    // Feedback and memory
    // ========================================

    /// Store the current problem and solution with the user's verdict
    ///
    /// Returns None (and changes nothing) unless the current run holds both
    /// a parsed problem and a solution.
    pub async fn record_feedback(
        &self,
        correct: bool,
        comment: Option<String>,
    ) -> Option<MemoryEntry> {
        let entry = {
            let slot = self.slot.lock().await;
            let run = &slot.run;
            let (Some(problem), Some(solution)) = (&run.problem, &run.solution) else {
                tracing::debug!("Feedback ignored: no solved problem in the current run");
                return None;
            };

            MemoryEntry::new(
                run.input_mode,
                run.submitted_text
                    .clone()
                    .unwrap_or_else(|| problem.problem_text.clone()),
                problem.clone(),
                solution.clone(),
                correct,
                comment.filter(|c| !c.trim().is_empty()),
            )
        };

        let entry_count = {
            let mut memory = self.memory.write().await;
            let evicted = memory.append(entry.clone());
            if evicted > 0 {
                tracing::debug!(
                    evicted = evicted,
                    capacity = ?memory.capacity(),
                    "Memory capacity reached, oldest entries evicted"
                );
            }
            memory.len()
        };

        tracing::info!(entry_id = %entry.id, was_correct = correct, "Feedback recorded");
        self.event_bus.emit_lossy(MentorEvent::MemoryUpdated {
            entry_count,
            timestamp: Utc::now(),
        });
        self.event_bus.emit_lossy(if correct {
            MentorEvent::notification(
                NotificationLevel::Success,
                "Thanks for the feedback!",
                "This solution has been saved to memory.",
            )
        } else {
            MentorEvent::notification(
                NotificationLevel::Info,
                "We'll improve!",
                "Your correction helps us learn.",
            )
        });

        Some(entry)
    }

    /// Newest first
    pub async fn memory_entries(&self) -> Vec<MemoryEntry> {
        self.memory.read().await.entries().to_vec()
    }

    pub async fn memory_entry(&self, id: Uuid) -> PipelineResult<MemoryEntry> {
        self.memory
            .read()
            .await
            .select(id)
            .cloned()
            .ok_or(PipelineError::NotFound(id))
    }

    /// Load a stored entry into the current run for display
    pub async fn select_memory_entry(&self, id: Uuid) -> PipelineResult<MemoryEntry> {
        let entry = self.memory_entry(id).await?;

        let mut slot = self.slot.lock().await;
        if slot.run.is_processing {
            return Err(PipelineError::Busy);
        }

        slot.generation += 1;
        slot.run = PipelineRun {
            input_mode: entry.input_mode,
            submitted_text: Some(entry.original_input.clone()),
            problem: Some(entry.problem.clone()),
            solution: Some(entry.solution.clone()),
            ..PipelineRun::cleared()
        };

        tracing::debug!(entry_id = %id, "Memory entry loaded into current run");
        Ok(entry)
    }

    pub async fn clear_memory(&self) {
        self.memory.write().await.clear();

        tracing::info!("Memory cleared");
        self.event_bus.emit_lossy(MentorEvent::MemoryUpdated {
            entry_count: 0,
            timestamp: Utc::now(),
        });
        self.event_bus.emit_lossy(MentorEvent::notification(
            NotificationLevel::Info,
            "Memory cleared",
            "",
        ));
    }

    // ========================================
    // Reset
    // ========================================

    /// Replace the run with the cleared state, abandoning any run in flight
    pub async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        let abandoned = slot.run.is_processing;

        slot.generation += 1;
        slot.run = PipelineRun::cleared();

        if abandoned {
            tracing::info!("Pipeline reset; in-flight run abandoned");
        } else {
            tracing::debug!("Pipeline reset");
        }
        self.event_bus.emit_lossy(MentorEvent::RunReset { timestamp: Utc::now() });
    }
}

//! Event types for the Math Mentor event system
//!
//! Provides shared event definitions and the EventBus used by the pipeline
//! orchestrator to publish live progress to observers (SSE clients, tests).

// Sub-modules (supporting types)
mod pipeline_types;
mod review_types;

pub use pipeline_types::{AgentKind, AgentState, AgentStatus, InputMode, VerificationStatus};
pub use review_types::{HitlKind, HitlRequest, NotificationLevel};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Math Mentor event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
/// Variant fields use the same camelCase names as the run snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum MentorEvent {
    /// A pipeline run (or a recognition pass) started
    RunStarted {
        run_id: Uuid,
        input_mode: InputMode,
        timestamp: DateTime<Utc>,
    },

    /// One stage changed status or message
    ///
    /// Carries the full ordered stage set so observers never have to merge
    /// partial updates.
    AgentStateChanged {
        run_id: Uuid,
        agent: AgentKind,
        agents: Vec<AgentState>,
        timestamp: DateTime<Utc>,
    },

    /// Recognized text is ready for the human to confirm or edit
    ExtractionReady {
        run_id: Uuid,
        input_mode: InputMode,
        extracted_text: String,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// The pipeline paused for human review
    HitlRequested {
        run_id: Uuid,
        request: HitlRequest,
        timestamp: DateTime<Utc>,
    },

    /// A pending review was approved or rejected
    HitlResolved {
        request_id: Uuid,
        approved: bool,
        timestamp: DateTime<Utc>,
    },

    /// All five stages completed and a solution is available
    SolutionReady {
        run_id: Uuid,
        final_answer: String,
        confidence: f64,
        verification_status: VerificationStatus,
        timestamp: DateTime<Utc>,
    },

    /// The run halted (recognition or stage failure)
    RunFailed {
        run_id: Uuid,
        /// Stage that failed; None when recognition failed before parse
        agent: Option<AgentKind>,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Pipeline state replaced by the cleared state
    RunReset { timestamp: DateTime<Utc> },

    /// Memory store contents changed (append or clear)
    MemoryUpdated {
        entry_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// User-facing notification (toast)
    Notification {
        level: NotificationLevel,
        title: String,
        description: String,
        timestamp: DateTime<Utc>,
    },
}

impl MentorEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            MentorEvent::RunStarted { .. } => "RunStarted",
            MentorEvent::AgentStateChanged { .. } => "AgentStateChanged",
            MentorEvent::ExtractionReady { .. } => "ExtractionReady",
            MentorEvent::HitlRequested { .. } => "HitlRequested",
            MentorEvent::HitlResolved { .. } => "HitlResolved",
            MentorEvent::SolutionReady { .. } => "SolutionReady",
            MentorEvent::RunFailed { .. } => "RunFailed",
            MentorEvent::RunReset { .. } => "RunReset",
            MentorEvent::MemoryUpdated { .. } => "MemoryUpdated",
            MentorEvent::Notification { .. } => "Notification",
        }
    }

    /// Build a notification event stamped now
    pub fn notification(
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        MentorEvent::Notification {
            level,
            title: title.into(),
            description: description.into(),
            timestamp: Utc::now(),
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use mm_common::events::{EventBus, MentorEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(MentorEvent::RunReset { timestamp: chrono::Utc::now() });
///
/// assert!(matches!(rx.try_recv(), Ok(MentorEvent::RunReset { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MentorEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MentorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MentorEvent,
    ) -> Result<usize, broadcast::error::SendError<MentorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MentorEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

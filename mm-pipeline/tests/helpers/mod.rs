//! Shared fixtures for mm-pipeline integration tests
//!
//! In-process gateway fakes with call counters, plus an optional gate that
//! holds the solver mid-call so tests can act while a run is in flight.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, Notify};

use mm_common::events::{EventBus, MentorEvent};
use mm_pipeline::gateways::{
    Extraction, GatewayError, GatewayResult, MediaCapture, RecognitionGateway, SolvingGateway,
};
use mm_pipeline::models::{Solution, SolutionStep, Topic, VerificationStatus};
use mm_pipeline::{Gateways, PipelineOrchestrator, PipelineSettings};

pub const DERIVATIVE_PROBLEM: &str = "Find the derivative of f(x) = x³ + 2x² - 5x + 3";
pub const DERIVATIVE_ANSWER: &str = "f'(x) = 3x² + 4x - 5";

// ========================================
// Recognition fake
// ========================================

pub struct MockRecognizer {
    name: &'static str,
    response: GatewayResult<Extraction>,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn returning(name: &'static str, text: &str, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            name,
            response: Ok(Extraction {
                text: text.to_string(),
                confidence,
            }),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str, error: GatewayError) -> Arc<Self> {
        Arc::new(Self {
            name,
            response: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionGateway for MockRecognizer {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn recognize(&self, _media: &MediaCapture) -> GatewayResult<Extraction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

// ========================================
// Solver fake
// ========================================

pub struct MockSolver {
    response: GatewayResult<Solution>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, Topic)>>,
    /// Signalled when a solve call starts
    pub entered: Notify,
    /// When set, each solve call waits for a permit before answering
    gate: Option<Notify>,
}

impl MockSolver {
    pub fn returning(solution: Solution) -> Arc<Self> {
        Arc::new(Self::build(Ok(solution), false))
    }

    pub fn failing(error: GatewayError) -> Arc<Self> {
        Arc::new(Self::build(Err(error), false))
    }

    /// Solver that blocks inside `solve` until [`MockSolver::release`]
    pub fn gated(solution: Solution) -> Arc<Self> {
        Arc::new(Self::build(Ok(solution), true))
    }

    fn build(response: GatewayResult<Solution>, gated: bool) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            entered: Notify::new(),
            gate: gated.then(Notify::new),
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, Topic)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SolvingGateway for MockSolver {
    async fn solve(&self, problem_text: &str, topic: Topic) -> GatewayResult<Solution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((problem_text.to_string(), topic));
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.response.clone()
    }
}

// ========================================
// Fixtures
// ========================================

/// Seven-step worked derivative
pub fn derivative_solution() -> Solution {
    let steps = [
        ("Identify the function", Some("f(x) = x³ + 2x² - 5x + 3"), None),
        ("Recall the power rule", Some("d/dx xⁿ = n·xⁿ⁻¹"), None),
        ("Differentiate x³", None, Some("3x²")),
        ("Differentiate 2x²", None, Some("4x")),
        ("Differentiate -5x", None, Some("-5")),
        ("Differentiate the constant 3", None, Some("0")),
        ("Combine the terms", None, Some(DERIVATIVE_ANSWER)),
    ];

    Solution {
        steps: steps
            .iter()
            .enumerate()
            .map(|(i, (description, formula, result))| SolutionStep {
                step_number: i as u32 + 1,
                description: description.to_string(),
                formula: formula.map(str::to_string),
                result: result.map(str::to_string),
            })
            .collect(),
        final_answer: DERIVATIVE_ANSWER.to_string(),
        confidence: 0.95,
        verification_status: VerificationStatus::Verified,
        explanation: "Apply the power rule term by term.".to_string(),
        retrieved_context: vec!["Power rule: d/dx xⁿ = n·xⁿ⁻¹".to_string()],
    }
}

pub fn png_capture() -> MediaCapture {
    MediaCapture::new(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A], "image/png")
}

pub fn webm_capture() -> MediaCapture {
    MediaCapture::new(vec![0x1A, 0x45, 0xDF, 0xA3], "audio/webm")
}

/// Orchestrator wired to fakes, with handles kept for inspection
pub struct Harness {
    pub orchestrator: PipelineOrchestrator,
    pub ocr: Arc<MockRecognizer>,
    pub asr: Arc<MockRecognizer>,
    pub solver: Arc<MockSolver>,
}

impl Harness {
    pub fn new(
        ocr: Arc<MockRecognizer>,
        asr: Arc<MockRecognizer>,
        solver: Arc<MockSolver>,
    ) -> Self {
        Self::with_settings(ocr, asr, solver, PipelineSettings::default())
    }

    pub fn with_settings(
        ocr: Arc<MockRecognizer>,
        asr: Arc<MockRecognizer>,
        solver: Arc<MockSolver>,
        settings: PipelineSettings,
    ) -> Self {
        let gateways = Gateways {
            ocr: ocr.clone(),
            asr: asr.clone(),
            solver: solver.clone(),
        };
        Self {
            orchestrator: PipelineOrchestrator::new(gateways, EventBus::new(256), settings),
            ocr,
            asr,
            solver,
        }
    }

    /// Text-only harness; recognizers answer but should never be called
    pub fn text(solver: Arc<MockSolver>) -> Self {
        Self::new(
            MockRecognizer::returning("ocr", "unused", 0.99),
            MockRecognizer::returning("asr", "unused", 0.99),
            solver,
        )
    }

    /// Image harness with the given OCR confidence
    pub fn image(text: &str, confidence: f64) -> Self {
        Self::new(
            MockRecognizer::returning("ocr", text, confidence),
            MockRecognizer::returning("asr", "unused", 0.99),
            MockSolver::returning(derivative_solution()),
        )
    }
}

/// Everything currently buffered on the receiver
pub fn drain(rx: &mut broadcast::Receiver<MentorEvent>) -> Vec<MentorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Notification titles in emission order
pub fn notification_titles(events: &[MentorEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            MentorEvent::Notification { title, .. } => Some(title.clone()),
            _ => None,
        })
        .collect()
}

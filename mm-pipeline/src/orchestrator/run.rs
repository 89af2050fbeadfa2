//! Stage execution for a single run
//!
//! Every write goes through [`PipelineOrchestrator::apply`], which drops it
//! when the run's generation has been superseded (reset or a newer run). The
//! lock is released before each gateway call. Stages run on a spawned task;
//! callers only await its handle.

use chrono::Utc;
use mm_common::events::{
    AgentKind, AgentState, AgentStatus, EventBus, MentorEvent, NotificationLevel,
};
use tokio::task::JoinError;
use uuid::Uuid;

use super::{hitl, PipelineOrchestrator};
use crate::classifier::classify;
use crate::gateways::{GatewayError, MediaCapture};
use crate::models::{InputMode, PipelineRun};

const SOLVE_FAILED: &str = "Failed to solve the problem. Please try again.";

/// The run was reset or replaced while in flight
#[derive(Debug)]
pub(super) struct Superseded;

type StageResult = Result<(), Superseded>;

fn agent_changed(run: &PipelineRun, run_id: Uuid, agent: AgentKind) -> MentorEvent {
    MentorEvent::AgentStateChanged {
        run_id,
        agent,
        agents: run.agents.clone(),
        timestamp: Utc::now(),
    }
}

impl PipelineOrchestrator {
    /// Spawn the solve stages and wait for them
    pub(super) async fn drive_solve(&self, generation: u64, run_id: Uuid, input: String) {
        let this = self.clone();
        let task = tokio::spawn(async move { this.execute(generation, run_id, &input).await });

        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(Superseded)) => tracing::debug!(run_id = %run_id, "Pipeline run abandoned"),
            Err(e) => self.fail_task(generation, run_id, e).await,
        }
    }

    /// Spawn the recognition pass and wait for it
    pub(super) async fn drive_recognition(
        &self,
        generation: u64,
        run_id: Uuid,
        media: MediaCapture,
        mode: InputMode,
    ) {
        let this = self.clone();
        let task =
            tokio::spawn(async move { this.recognize(generation, run_id, &media, mode).await });

        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(Superseded)) => {
                tracing::debug!(run_id = %run_id, "Recognition result discarded after reset")
            }
            Err(e) => self.fail_task(generation, run_id, e).await,
        }
    }

    /// Release a run whose task died without finishing
    async fn fail_task(&self, generation: u64, run_id: Uuid, error: JoinError) {
        let error = error.to_string();
        tracing::error!(run_id = %run_id, error = %error, "Pipeline task failed");

        let failed = self
            .apply(generation, |run, bus| {
                let running = run
                    .agents
                    .iter()
                    .find(|a| a.status == AgentStatus::Running)
                    .map(|a| a.agent);
                if let Some(agent) = running {
                    run.agent_mut(agent).fail("Stage aborted", Utc::now());
                    bus.emit_lossy(agent_changed(run, run_id, agent));
                }
                run.is_processing = false;

                bus.emit_lossy(MentorEvent::RunFailed {
                    run_id,
                    agent: running,
                    error: error.clone(),
                    timestamp: Utc::now(),
                });
                bus.emit_lossy(MentorEvent::notification(
                    NotificationLevel::Error,
                    "Error",
                    SOLVE_FAILED,
                ));
            })
            .await;
        if failed.is_err() {
            tracing::debug!(run_id = %run_id, "Failed task was already superseded");
        }
    }

    /// Apply `f` to the run if `generation` still owns it
    async fn apply<F>(&self, generation: u64, f: F) -> StageResult
    where
        F: FnOnce(&mut PipelineRun, &EventBus),
    {
        let mut slot = self.slot.lock().await;
        if slot.generation != generation {
            return Err(Superseded);
        }
        f(&mut slot.run, &self.event_bus);
        debug_assert!(slot.run.running_count() <= 1);
        debug_assert!(slot.run.stage_order_holds());
        Ok(())
    }

    /// Update one stage and publish the new stage set
    async fn stage<F>(&self, generation: u64, run_id: Uuid, agent: AgentKind, f: F) -> StageResult
    where
        F: FnOnce(&mut AgentState),
    {
        self.apply(generation, |run, bus| {
            f(run.agent_mut(agent));
            bus.emit_lossy(agent_changed(run, run_id, agent));
        })
        .await
    }

    /// parse → route → solve → verify → explain
    pub(super) async fn execute(&self, generation: u64, run_id: Uuid, input: &str) -> StageResult {
        // PARSE
        self.stage(generation, run_id, AgentKind::Parse, |a| {
            a.start("Parsing input into structured format", Utc::now())
        })
        .await?;

        let problem = classify(input);
        let topic = problem.topic;
        tracing::debug!(
            run_id = %run_id,
            topic = %topic,
            variables = ?problem.variables,
            "Problem classified"
        );

        self.apply(generation, |run, bus| {
            run.problem = Some(problem.clone());
            run.agent_mut(AgentKind::Parse)
                .complete(format!("Detected {} problem", topic), Utc::now());
            bus.emit_lossy(agent_changed(run, run_id, AgentKind::Parse));
        })
        .await?;

        // ROUTE
        self.stage(generation, run_id, AgentKind::Route, |a| {
            a.start(format!("Routing to {} solver", topic), Utc::now())
        })
        .await?;
        self.stage(generation, run_id, AgentKind::Route, |a| {
            a.complete(format!("Routed to {} solver", topic), Utc::now())
        })
        .await?;

        // SOLVE
        self.stage(generation, run_id, AgentKind::Solve, |a| {
            a.start("Retrieving relevant knowledge...", Utc::now())
        })
        .await?;
        self.stage(generation, run_id, AgentKind::Solve, |a| {
            a.set_message("Applying solution strategy...")
        })
        .await?;

        let solution = match self.gateways.solver.solve(&problem.problem_text, topic).await {
            Ok(solution) => solution,
            Err(e) => return self.fail_solve(generation, run_id, e).await,
        };

        self.stage(generation, run_id, AgentKind::Solve, |a| {
            a.complete(format!("Solution found ({} steps)", solution.steps.len()), Utc::now())
        })
        .await?;

        // VERIFY
        self.stage(generation, run_id, AgentKind::Verify, |a| {
            a.start("Checking solver verification", Utc::now())
        })
        .await?;
        self.stage(generation, run_id, AgentKind::Verify, |a| {
            a.complete(solution.verification_message(), Utc::now())
        })
        .await?;

        // EXPLAIN
        self.stage(generation, run_id, AgentKind::Explain, |a| {
            a.start("Generating step-by-step explanation", Utc::now())
        })
        .await?;

        self.apply(generation, |run, bus| {
            run.agent_mut(AgentKind::Explain)
                .complete("Explanation ready", Utc::now());
            run.solution = Some(solution.clone());
            run.is_processing = false;

            bus.emit_lossy(agent_changed(run, run_id, AgentKind::Explain));
            bus.emit_lossy(MentorEvent::SolutionReady {
                run_id,
                final_answer: solution.final_answer.clone(),
                confidence: solution.confidence,
                verification_status: solution.verification_status,
                timestamp: Utc::now(),
            });
            bus.emit_lossy(MentorEvent::notification(
                NotificationLevel::Success,
                "Problem Solved!",
                "Check the solution below.",
            ));

            tracing::info!(
                run_id = %run_id,
                topic = %topic,
                confidence = solution.confidence,
                solve_ms = ?run.agent(AgentKind::Solve).duration_ms(),
                "Pipeline run completed"
            );
        })
        .await
    }

    async fn fail_solve(&self, generation: u64, run_id: Uuid, error: GatewayError) -> StageResult {
        tracing::warn!(
            run_id = %run_id,
            kind = error.kind(),
            error = %error,
            "Solving gateway failed"
        );

        let description = error.user_message().unwrap_or_else(|| SOLVE_FAILED.to_string());

        self.apply(generation, |run, bus| {
            run.agent_mut(AgentKind::Solve)
                .fail(error.to_string(), Utc::now());
            run.is_processing = false;

            bus.emit_lossy(agent_changed(run, run_id, AgentKind::Solve));
            bus.emit_lossy(MentorEvent::RunFailed {
                run_id,
                agent: Some(AgentKind::Solve),
                error: error.to_string(),
                timestamp: Utc::now(),
            });
            bus.emit_lossy(MentorEvent::notification(
                NotificationLevel::Error,
                "Error",
                description,
            ));
        })
        .await
    }

    /// Recognition pass for image/audio input
    pub(super) async fn recognize(
        &self,
        generation: u64,
        run_id: Uuid,
        media: &MediaCapture,
        mode: InputMode,
    ) -> StageResult {
        let gateway = match mode {
            InputMode::Audio => &self.gateways.asr,
            _ => &self.gateways.ocr,
        };

        let extraction = match gateway.recognize(media).await {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(
                    run_id = %run_id,
                    gateway = gateway.name(),
                    kind = e.kind(),
                    error = %e,
                    "Recognition gateway failed"
                );
                let fallback = match mode {
                    InputMode::Audio => "Failed to transcribe the audio. Please try again.",
                    _ => "Failed to extract text from the image. Please try again.",
                };
                let description = e.user_message().unwrap_or_else(|| fallback.to_string());

                return self
                    .apply(generation, |run, bus| {
                        run.is_processing = false;
                        bus.emit_lossy(MentorEvent::RunFailed {
                            run_id,
                            agent: None,
                            error: e.to_string(),
                            timestamp: Utc::now(),
                        });
                        bus.emit_lossy(MentorEvent::notification(
                            NotificationLevel::Error,
                            "Error",
                            description,
                        ));
                    })
                    .await;
            }
        };

        let threshold = self.settings.hitl_confidence_threshold;
        let review = if hitl::needs_review(extraction.confidence, threshold) {
            hitl::correction_request(mode, &extraction.text)
        } else {
            None
        };

        tracing::info!(
            run_id = %run_id,
            confidence = extraction.confidence,
            needs_review = review.is_some(),
            "Extraction ready"
        );

        self.apply(generation, |run, bus| {
            run.extracted_text = Some(extraction.text.clone());
            run.extraction_confidence = Some(extraction.confidence);
            run.is_processing = false;

            bus.emit_lossy(MentorEvent::ExtractionReady {
                run_id,
                input_mode: mode,
                extracted_text: extraction.text.clone(),
                confidence: extraction.confidence,
                timestamp: Utc::now(),
            });

            if let Some(request) = review {
                run.agent_mut(AgentKind::Parse)
                    .wait_for_review("Waiting for human review of the extracted text");
                run.hitl_request = Some(request.clone());

                bus.emit_lossy(agent_changed(run, run_id, AgentKind::Parse));
                bus.emit_lossy(MentorEvent::HitlRequested {
                    run_id,
                    request,
                    timestamp: Utc::now(),
                });
            }
        })
        .await
    }
}

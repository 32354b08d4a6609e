use std::sync::Arc;
use std::time::Duration;

use crate::agent_engine::decision::DecisionClient;
use crate::agent_engine::feedback::{augment_instruction, FeedbackProvider};
use crate::agent_engine::history::ConversationHistory;
use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::state::{LoopConfig, TaskReport, TaskState};
use crate::agent_engine::action::Status;
use crate::device::traits::DeviceDriver;
use crate::errors::{TouchPilotError, TouchPilotResult};
use crate::executor::dispatcher;
use crate::perception::screenshot::capture;

/// Drives one task: observe, decide, act, until a terminal state.
pub struct TaskRunner {
    driver: Arc<dyn DeviceDriver>,
    client: DecisionClient,
    feedback: Arc<dyn FeedbackProvider>,
    config: LoopConfig,
}

impl TaskRunner {
    pub fn new(
        driver: Arc<dyn DeviceDriver>,
        client: DecisionClient,
        feedback: Arc<dyn FeedbackProvider>,
        config: LoopConfig,
    ) -> Self {
        Self {
            driver,
            client,
            feedback,
            config,
        }
    }

    /// Run `task` to completion, appending every decided turn to `history`.
    ///
    /// Decision failures end the task as [`TaskState::Stalled`]; device and
    /// feedback failures are returned as [`TouchPilotError::Aborted`].
    pub async fn run(
        &self,
        task: &str,
        history: &mut ConversationHistory,
    ) -> TouchPilotResult<TaskReport> {
        let mut ctrl = LoopController::new(self.config.max_steps);
        let mut instruction = task.to_string();
        tracing::info!(task = %task, max_steps = self.config.max_steps, "task started");

        let (state, step) = loop {
            if ctrl.should_stop() {
                break (TaskState::StepLimitReached, ctrl.completed());
            }
            let step = ctrl.current_step();
            tracing::info!(step, "── step ──");

            // ── Observe ─────────────────────────────────────────────────────
            let image = capture(self.driver.as_ref(), self.config.max_image_edge)
                .await
                .map_err(|e| aborted(step, e))?;

            // ── Decide ──────────────────────────────────────────────────────
            let action = match self.client.decide(history, &instruction, &image).await {
                Ok(action) => action,
                Err(e) if e.is_decision_failure() => {
                    let reason = e.to_string();
                    break (TaskState::Stalled { reason }, step);
                }
                Err(e) => return Err(aborted(step, e)),
            };

            // ── Act ─────────────────────────────────────────────────────────
            let status = dispatcher::execute(self.driver.as_ref(), &action)
                .await
                .map_err(|e| aborted(step, e))?;
            if action.directive.is_some() && self.config.settle_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.settle_ms)).await;
            }

            match status {
                Status::Continue => ctrl.record_step(),
                Status::NeedFeedback => {
                    let answer = self
                        .feedback
                        .request_feedback(&instruction, &action)
                        .await
                        .map_err(|e| aborted(step, e))?;
                    match answer {
                        Some(feedback) => {
                            tracing::info!(feedback = %feedback, "feedback received");
                            instruction = augment_instruction(&instruction, &feedback);
                        }
                        None => break (TaskState::NeedFeedback, step),
                    }
                }
                terminal => break (TaskState::from_status(terminal), step),
            }
        };
        Ok(self.finish(state, step, instruction, history))
    }

    fn finish(
        &self,
        state: TaskState,
        step: u32,
        instruction: String,
        history: &ConversationHistory,
    ) -> TaskReport {
        debug_assert!(state.is_terminal(), "finish called with a running state");
        if state.is_success() {
            tracing::info!(step, "{}", state.describe());
        } else {
            tracing::warn!(step, "{}", state.describe());
        }
        TaskReport {
            state,
            step,
            instruction,
            history_turns: history.len(),
        }
    }
}

fn aborted(step: u32, source: TouchPilotError) -> TouchPilotError {
    tracing::error!(step, error = %source, "task aborted");
    TouchPilotError::Aborted {
        step,
        source: Box::new(source),
    }
}

use crate::agent_engine::action::Status;

/// States of the task loop. Everything except `Continue` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskState {
    Continue,
    Finish,
    Satisfied,
    Impossible,
    Interrupt,
    /// Feedback was requested but none could be obtained.
    NeedFeedback,
    /// The decision service failed or returned no usable action.
    Stalled { reason: String },
    StepLimitReached,
}

impl TaskState {
    pub fn from_status(status: Status) -> Self {
        match status {
            Status::Continue => TaskState::Continue,
            Status::Finish => TaskState::Finish,
            Status::Satisfied => TaskState::Satisfied,
            Status::Impossible => TaskState::Impossible,
            Status::Interrupt => TaskState::Interrupt,
            Status::NeedFeedback => TaskState::NeedFeedback,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Continue)
    }

    /// True when the task logic concluded successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskState::Finish | TaskState::Satisfied)
    }

    pub fn describe(&self) -> String {
        match self {
            TaskState::Continue => "task still running".into(),
            TaskState::Finish => "task completed successfully".into(),
            TaskState::Satisfied => "task was already satisfied, nothing to do".into(),
            TaskState::Impossible => "task reported impossible to complete".into(),
            TaskState::Interrupt => "task interrupted by the decision service".into(),
            TaskState::NeedFeedback => "task needs feedback but none was provided".into(),
            TaskState::Stalled { reason } => {
                format!("no usable action from the decision service: {reason}")
            }
            TaskState::StepLimitReached => "reached the maximum number of steps".into(),
        }
    }
}

/// Final result of one task session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaskReport {
    pub state: TaskState,
    /// 1-based number of the last step attempted, 0 when none ran.
    pub step: u32,
    /// Instruction as it stood at the end, feedback included.
    pub instruction: String,
    pub history_turns: usize,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoopConfig {
    pub max_steps: u32,
    /// Pause after each executed action.
    pub settle_ms: u64,
    pub max_image_edge: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            settle_ms: 1000,
            max_image_edge: 1120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_continue_is_non_terminal() {
        assert!(!TaskState::from_status(Status::Continue).is_terminal());
        for status in [
            Status::Finish,
            Status::Satisfied,
            Status::Impossible,
            Status::Interrupt,
            Status::NeedFeedback,
        ] {
            assert!(TaskState::from_status(status).is_terminal());
        }
        assert!(TaskState::StepLimitReached.is_terminal());
        assert!(TaskState::Stalled { reason: "x".into() }.is_terminal());
    }

    #[test]
    fn serializes_with_state_tag() {
        let state = TaskState::Stalled {
            reason: "timeout".into(),
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json, serde_json::json!({"state": "stalled", "reason": "timeout"}));
    }
}

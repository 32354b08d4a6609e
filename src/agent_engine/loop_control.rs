/// Step budget of one task session.
pub struct LoopController {
    max_steps: u32,
    completed: u32,
}

impl LoopController {
    pub fn new(max_steps: u32) -> Self {
        Self {
            max_steps,
            completed: 0,
        }
    }

    /// Number of the step about to run (1-based).
    pub fn current_step(&self) -> u32 {
        self.completed + 1
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Count one `continue` round.
    pub fn record_step(&mut self) {
        self.completed += 1;
    }

    pub fn should_stop(&self) -> bool {
        self.completed >= self.max_steps
    }
}

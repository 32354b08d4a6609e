use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::agent_engine::action::Action;
use crate::errors::{TouchPilotError, TouchPilotResult};

/// Source of human feedback when the decision service asks for it.
#[async_trait]
pub trait FeedbackProvider: Send + Sync {
    /// `None` means no feedback is available and the task should stop.
    async fn request_feedback(
        &self,
        instruction: &str,
        action: &Action,
    ) -> TouchPilotResult<Option<String>>;
}

/// Interactive feedback on the controlling terminal.
///
/// One buffered reader lives for the whole session so lines piped in ahead
/// of a prompt are kept for the next one.
pub struct ConsoleFeedback<R = Stdin> {
    lines: Mutex<Lines<BufReader<R>>>,
}

impl ConsoleFeedback<Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin + Send> ConsoleFeedback<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(reader).lines()),
        }
    }

    /// Ask a yes/no question; anything but `y`/`yes` is no.
    pub async fn confirm(&self, question: &str) -> TouchPilotResult<bool> {
        let answer = self.read_line(&format!("{question} [y/N]: ")).await?;
        Ok(matches!(
            answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }

    /// Trimmed next line, `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> TouchPilotResult<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let line = self
            .lines
            .lock()
            .await
            .next_line()
            .await
            .map_err(|e| TouchPilotError::Feedback(format!("failed to read input: {e}")))?;
        Ok(line.map(|l| l.trim().to_string()))
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> FeedbackProvider for ConsoleFeedback<R> {
    async fn request_feedback(
        &self,
        instruction: &str,
        action: &Action,
    ) -> TouchPilotResult<Option<String>> {
        let mut prompt = format!("\nThe agent needs feedback for task: {instruction}\n");
        if let Some(thought) = &action.thought {
            prompt.push_str(&format!("Agent: {thought}\n"));
        }
        prompt.push_str("Feedback (empty to stop): ");
        let answer = self.read_line(&prompt).await?;
        Ok(answer.filter(|s| !s.is_empty()))
    }
}

/// Append a piece of feedback to the task instruction.
pub fn augment_instruction(instruction: &str, feedback: &str) -> String {
    format!("{instruction} (Feedback: {feedback})")
}

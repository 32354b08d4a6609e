use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{TouchPilotError, TouchPilotResult};

/// Stands in for the screenshot in recorded user turns; image bytes are never kept.
pub const SCREENSHOT_MARKER: &str = "[image]";

/// One `{role, content}` record, the persisted unit of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

/// A user instruction and the raw assistant payload it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user: HistoryMessage,
    pub assistant: HistoryMessage,
}

/// Text of a user turn, without the image.
pub fn question_text(instruction: &str, screenshot_label: &str) -> String {
    format!("<Question>{instruction}</Question>\n{screenshot_label}")
}

/// Ordered conversation log of one task session.
pub struct ConversationHistory {
    pub session_id: String,
    turns: Vec<Turn>,
    /// Max turns replayed in a request; `None` replays everything.
    limit: Option<usize>,
    screenshot_label: String,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            turns: Vec::new(),
            limit: None,
            screenshot_label: "Current screenshot:".into(),
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_screenshot_label(mut self, label: impl Into<String>) -> Self {
        self.screenshot_label = label.into();
        self
    }

    pub fn screenshot_label(&self) -> &str {
        &self.screenshot_label
    }

    pub fn append(&mut self, instruction: &str, raw_action: &str) {
        let user = HistoryMessage {
            role: "user".into(),
            content: format!(
                "{}{SCREENSHOT_MARKER}",
                question_text(instruction, &self.screenshot_label)
            ),
        };
        let assistant = HistoryMessage {
            role: "assistant".into(),
            content: raw_action.to_string(),
        };
        self.turns.push(Turn { user, assistant });
        tracing::debug!(
            session = %self.session_id,
            turns = self.turns.len(),
            "history turn appended"
        );
    }

    /// Turns to replay in the next request, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        let skip = match self.limit {
            Some(limit) => self.turns.len().saturating_sub(limit),
            None => 0,
        };
        self.turns[skip..].to_vec()
    }

    pub fn reset(&mut self) {
        tracing::info!(session = %self.session_id, dropped = self.turns.len(), "history reset");
        self.turns.clear();
    }

    /// Every turn flattened into `{role, content}` records, ignoring the replay limit.
    pub fn export(&self) -> Vec<HistoryMessage> {
        self.turns
            .iter()
            .flat_map(|t| [t.user.clone(), t.assistant.clone()])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn message_count(&self) -> usize {
        self.turns.len() * 2
    }

    /// Write the exported history as pretty JSON into `dir`, one file per session.
    pub fn save_to_dir(&self, dir: &Path) -> TouchPilotResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let ts = chrono::Utc::now().timestamp();
        let mut path = dir.join(format!("conversation_history_{ts}.json"));
        if path.exists() {
            let short = self.session_id.split('-').next().unwrap_or("session");
            path = dir.join(format!("conversation_history_{ts}_{short}.json"));
        }
        let content = serde_json::to_string_pretty(&self.export())?;
        std::fs::write(&path, content)?;
        tracing::info!(
            path = %path.display(),
            messages = self.message_count(),
            "conversation history saved"
        );
        Ok(path)
    }

    /// Read a file written by [`save_to_dir`](Self::save_to_dir).
    pub fn load(path: &Path) -> TouchPilotResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let messages: Vec<HistoryMessage> = serde_json::from_str(&content)?;
        if messages.len() % 2 != 0 {
            return Err(TouchPilotError::History(format!(
                "{} has an odd number of messages",
                path.display()
            )));
        }

        let mut history = Self::new();
        for pair in messages.chunks(2) {
            let (user, assistant) = (&pair[0], &pair[1]);
            if user.role != "user" || assistant.role != "assistant" {
                return Err(TouchPilotError::History(format!(
                    "{}: expected user/assistant pairs, found {}/{}",
                    path.display(),
                    user.role,
                    assistant.role
                )));
            }
            history.turns.push(Turn {
                user: user.clone(),
                assistant: assistant.clone(),
            });
        }
        tracing::info!(
            path = %path.display(),
            turns = history.len(),
            "conversation history loaded"
        );
        Ok(history)
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// `<data_local_dir>/touchpilot/sessions`, falling back to the current working directory.
pub fn default_history_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("touchpilot").join("sessions");
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

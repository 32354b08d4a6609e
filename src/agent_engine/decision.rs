use std::sync::Arc;

use crate::agent_engine::action::Action;
use crate::agent_engine::history::{question_text, ConversationHistory};
use crate::errors::{TouchPilotError, TouchPilotResult};
use crate::llm::decode::{decode_json_body, extract_message_content};
use crate::llm::provider::DecisionProvider;
use crate::llm::schema::system_prompt;
use crate::llm::types::ChatMessage;
use crate::perception::types::PreparedImage;

/// Asks the decision service for the next action and records the exchange.
pub struct DecisionClient {
    provider: Arc<dyn DecisionProvider>,
    system_prompt: String,
}

impl DecisionClient {
    /// `directive` replaces the built-in behavioural text; the schema is always appended.
    pub fn new(
        provider: Arc<dyn DecisionProvider>,
        directive: Option<&str>,
    ) -> TouchPilotResult<Self> {
        Ok(Self {
            provider,
            system_prompt: system_prompt(directive)?,
        })
    }

    /// Request messages: system prompt, prior turns as text, then the live
    /// instruction with the screenshot.
    pub fn build_messages(
        &self,
        history: &ConversationHistory,
        instruction: &str,
        image: &PreparedImage,
    ) -> Vec<ChatMessage> {
        let turns = history.snapshot();
        let mut messages = Vec::with_capacity(turns.len() * 2 + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        for turn in turns {
            messages.push(ChatMessage::user(turn.user.content));
            messages.push(ChatMessage::assistant(turn.assistant.content));
        }
        messages.push(ChatMessage::user_with_image(
            question_text(instruction, history.screenshot_label()),
            image.data_uri(),
        ));
        messages
    }

    /// One decision round. On success the raw payload is appended to
    /// `history`; on any failure `history` is left untouched.
    pub async fn decide(
        &self,
        history: &mut ConversationHistory,
        instruction: &str,
        image: &PreparedImage,
    ) -> TouchPilotResult<Action> {
        let messages = self.build_messages(history, instruction, image);
        tracing::info!(
            provider = self.provider.name(),
            prior_turns = history.snapshot().len(),
            "requesting next action"
        );

        let body = self.provider.complete(&messages).await.map_err(|e| match e {
            e if e.is_decision_failure() => e,
            other => TouchPilotError::DecisionUnavailable(other.to_string()),
        })?;
        let reply = decode_json_body(&body)?;
        let payload = extract_message_content(&reply)?;
        tracing::debug!(payload = %payload, "decision payload");

        let action = Action::parse(&payload)?;
        history.append(instruction, &payload);
        tracing::info!(action = %action, "decision received");
        Ok(action)
    }
}

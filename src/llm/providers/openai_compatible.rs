use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{TouchPilotError, TouchPilotResult};
use crate::llm::provider::DecisionProvider;
use crate::llm::types::{CallConfig, ChatMessage};

/// Chat-completions endpoint speaking the OpenAI wire format (Ollama, vLLM, ...).
pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: Option<String>,
    call: CallConfig,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        id: String,
        api_base: String,
        api_key: Option<String>,
        call: CallConfig,
        timeout: Duration,
    ) -> TouchPilotResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            id,
            api_base,
            api_key,
            call,
            timeout,
            client,
        })
    }

    fn build_body(&self, messages: &[ChatMessage]) -> TouchPilotResult<serde_json::Value> {
        let mut body = serde_json::json!({
            "model": self.call.model,
            "messages": serde_json::to_value(messages)?,
            "stream": false,
        });
        if let Some(t) = self.call.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        Ok(body)
    }

    fn unavailable(&self, err: reqwest::Error) -> TouchPilotError {
        if err.is_timeout() {
            TouchPilotError::DecisionUnavailable(format!(
                "{}: no reply within {}s",
                self.id,
                self.timeout.as_secs()
            ))
        } else {
            TouchPilotError::DecisionUnavailable(format!("{}: {err}", self.id))
        }
    }
}

#[async_trait]
impl DecisionProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn complete(&self, messages: &[ChatMessage]) -> TouchPilotResult<Vec<u8>> {
        let body = self.build_body(messages)?;

        tracing::debug!(
            provider = %self.id,
            model = %self.call.model,
            messages = messages.len(),
            "sending decision request"
        );
        tracing::debug!(
            body = %sanitized_for_log(&body),
            "request body (sanitized, base64 omitted)"
        );

        let mut request = self.client.post(&self.api_base).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(TouchPilotError::DecisionUnavailable(format!(
                "{}: {}: {}",
                self.id, status, err_body
            )));
        }

        let bytes = response.bytes().await.map_err(|e| self.unavailable(e))?;
        tracing::debug!(provider = %self.id, bytes = bytes.len(), "decision response received");
        Ok(bytes.to_vec())
    }
}

/// Copy of `body` with inline images replaced, for logging only.
fn sanitized_for_log(body: &serde_json::Value) -> String {
    let mut log_body = body.clone();
    if let Some(msgs) = log_body.get_mut("messages").and_then(|m| m.as_array_mut()) {
        for msg in msgs {
            // content is either a string or an array of parts; only parts carry images.
            let Some(parts) = msg.get_mut("content").and_then(|c| c.as_array_mut()) else {
                continue;
            };
            for part in parts {
                if part.get("type").and_then(|t| t.as_str()) != Some("image_url") {
                    continue;
                }
                if let Some(url) = part.get_mut("image_url").and_then(|u| u.get_mut("url")) {
                    *url = serde_json::Value::String("<omitted_base64_image>".to_string());
                }
            }
        }
    }
    serde_json::to_string(&log_body).unwrap_or_default()
}

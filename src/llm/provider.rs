use async_trait::async_trait;

use crate::errors::TouchPilotResult;
use crate::llm::types::ChatMessage;

/// Transport to the decision service.
///
/// Implementations return the raw response body; decoding and action parsing
/// belong to the decision client so every provider gets the same leniency.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Send one chat request. Transport failures, timeouts and non-2xx
    /// statuses are reported as `DecisionUnavailable`.
    async fn complete(&self, messages: &[ChatMessage]) -> TouchPilotResult<Vec<u8>>;
}

pub mod decode;
pub mod provider;
pub mod providers;
pub mod schema;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::errors::TouchPilotResult;
use crate::llm::provider::DecisionProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;

/// Build the decision provider described by `[decision]`.
pub fn provider_from_config(config: &AppConfig) -> TouchPilotResult<Arc<dyn DecisionProvider>> {
    let decision = &config.decision;
    let provider = OpenAiCompatibleProvider::new(
        decision.model.clone(),
        decision.api_base.clone(),
        config.resolved_api_key(),
        CallConfig {
            model: decision.model.clone(),
            temperature: decision.temperature,
        },
        Duration::from_secs(decision.timeout_secs),
    )?;
    tracing::info!(
        api_base = %decision.api_base,
        model = %decision.model,
        timeout_secs = decision.timeout_secs,
        "decision provider ready"
    );
    Ok(Arc::new(provider))
}

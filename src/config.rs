use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{TouchPilotError, TouchPilotResult};

/// Environment variable that overrides `decision.api_key`.
pub const API_KEY_ENV: &str = "TOUCHPILOT_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

/// Endpoint of the OpenAI-compatible decision service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Optional bearer token (falls back to env var TOUCHPILOT_API_KEY).
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            temperature: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:11434/v1/chat/completions".into()
}

fn default_model() -> String {
    "agentcpm:latest".into()
}

fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// ADB serial; `None` lets adb pick the only attached device.
    #[serde(default)]
    pub serial: Option<String>,
    /// Pause after each executed action so the UI can settle.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Long edge of the screenshot sent to the model, in pixels.
    #[serde(default = "default_max_image_edge")]
    pub max_image_edge: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            serial: None,
            settle_ms: default_settle_ms(),
            max_image_edge: default_max_image_edge(),
        }
    }
}

fn default_adb_path() -> String {
    "adb".into()
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_max_image_edge() -> u32 {
    1120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Maximum number of past turns replayed to the service. `None` = all.
    #[serde(default)]
    pub history_limit: Option<usize>,
    #[serde(default)]
    pub save_history: SaveHistory,
    #[serde(default)]
    pub history_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            history_limit: None,
            save_history: SaveHistory::default(),
            history_dir: None,
        }
    }
}

fn default_max_steps() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SaveHistory {
    /// Prompt on the console when the task ends.
    #[default]
    Ask,
    Always,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Replaces the built-in behavioural directive. The action schema is
    /// always appended after it.
    #[serde(default)]
    pub system_template: Option<String>,
    /// Text placed before the screenshot in every user turn.
    #[serde(default = "default_screenshot_label")]
    pub screenshot_label: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system_template: None,
            screenshot_label: default_screenshot_label(),
        }
    }
}

fn default_screenshot_label() -> String {
    "Current screenshot:".into()
}

impl AppConfig {
    /// Bearer token for the decision service, preferring the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.decision.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> TouchPilotResult<()> {
        if self.decision.api_base.trim().is_empty() {
            return Err(TouchPilotError::Config("decision.api_base is empty".into()));
        }
        if self.decision.model.trim().is_empty() {
            return Err(TouchPilotError::Config("decision.model is empty".into()));
        }
        if self.decision.timeout_secs == 0 {
            return Err(TouchPilotError::Config(
                "decision.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.device.max_image_edge == 0 {
            return Err(TouchPilotError::Config(
                "device.max_image_edge must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    let candidate = std::env::current_dir().ok()?.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Some(candidate);
    }
    None
}

/// Load the config from `explicit` if given (it must exist), otherwise from
/// the first `config.toml` found; no file at all yields the defaults.
pub fn load_config(explicit: Option<&Path>) -> TouchPilotResult<AppConfig> {
    let path = match explicit {
        Some(p) if !p.exists() => {
            return Err(TouchPilotError::Config(format!(
                "config file {} does not exist",
                p.display()
            )))
        }
        Some(p) => p.to_path_buf(),
        None => match resolve_config_path() {
            Some(p) => p,
            None => {
                tracing::info!("no config.toml found, using built-in defaults");
                return Ok(AppConfig::default());
            }
        },
    };
    let config = parse_config(&std::fs::read_to_string(&path)?)?;
    tracing::info!(path = %path.display(), model = %config.decision.model, "config loaded");
    Ok(config)
}

pub fn parse_config(content: &str) -> TouchPilotResult<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.decision.model, "agentcpm:latest");
        assert_eq!(cfg.decision.timeout_secs, 120);
        assert_eq!(cfg.device.max_image_edge, 1120);
        assert_eq!(cfg.device.settle_ms, 1000);
        assert_eq!(cfg.agent.max_steps, 10);
        assert_eq!(cfg.agent.save_history, SaveHistory::Ask);
        assert!(cfg.agent.history_limit.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = parse_config(
            r#"
            [decision]
            api_base = "http://10.0.0.2:8000/v1/chat/completions"
            temperature = 0.2

            [device]
            serial = "emulator-5554"

            [agent]
            max_steps = 25
            history_limit = 6
            save_history = "never"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.decision.api_base, "http://10.0.0.2:8000/v1/chat/completions");
        assert_eq!(cfg.decision.model, "agentcpm:latest");
        assert_eq!(cfg.decision.temperature, Some(0.2));
        assert_eq!(cfg.device.serial.as_deref(), Some("emulator-5554"));
        assert_eq!(cfg.device.adb_path, "adb");
        assert_eq!(cfg.agent.max_steps, 25);
        assert_eq!(cfg.agent.history_limit, Some(6));
        assert_eq!(cfg.agent.save_history, SaveHistory::Never);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = parse_config("[decision]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, TouchPilotError::Config(_)));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here/config.toml"))).unwrap_err();
        assert!(matches!(err, TouchPilotError::Config(_)));
    }
}

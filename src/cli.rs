//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, SaveHistory};

/// TouchPilot - drive an Android device toward a natural-language goal
#[derive(Parser, Debug)]
#[command(name = "touchpilot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Natural-language task to accomplish
    #[arg(short, long)]
    pub task: String,

    /// ADB serial of the target device (overrides config)
    #[arg(short, long, env = "TOUCHPILOT_DEVICE")]
    pub device: Option<String>,

    /// Maximum number of `continue` steps (overrides config)
    #[arg(short, long)]
    pub max_steps: Option<u32>,

    /// Path to config.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Decision service endpoint (overrides config)
    #[arg(long, env = "TOUCHPILOT_API_BASE")]
    pub api_base: Option<String>,

    /// Model name (overrides config)
    #[arg(long, env = "TOUCHPILOT_MODEL")]
    pub model: Option<String>,

    /// Continue from a saved conversation history file
    #[arg(long, value_name = "FILE")]
    pub resume: Option<PathBuf>,

    /// Start from an empty history even when resuming
    #[arg(long)]
    pub reset_history: bool,

    /// Whether to save the conversation when the task ends
    #[arg(long, value_enum)]
    pub save_history: Option<SaveHistory>,

    /// Number of past turns replayed to the model (overrides config)
    #[arg(long)]
    pub history_limit: Option<usize>,
}

impl Cli {
    /// Fold command-line overrides into `config`.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(serial) = &self.device {
            config.device.serial = Some(serial.clone());
        }
        if let Some(max_steps) = self.max_steps {
            config.agent.max_steps = max_steps;
        }
        if let Some(api_base) = &self.api_base {
            config.decision.api_base = api_base.clone();
        }
        if let Some(model) = &self.model {
            config.decision.model = model.clone();
        }
        if let Some(save) = self.save_history {
            config.agent.save_history = save;
        }
        if let Some(limit) = self.history_limit {
            config.agent.history_limit = Some(limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_is_required() {
        assert!(Cli::try_parse_from(["touchpilot"]).is_err());
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "touchpilot",
            "--task",
            "open settings",
            "--device",
            "emulator-5554",
            "--max-steps",
            "3",
            "--save-history",
            "never",
            "--history-limit",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.task, "open settings");

        let mut config = AppConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.device.serial.as_deref(), Some("emulator-5554"));
        assert_eq!(config.agent.max_steps, 3);
        assert_eq!(config.agent.save_history, SaveHistory::Never);
        assert_eq!(config.agent.history_limit, Some(4));
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["touchpilot", "-t", "go home", "--reset-history"]).unwrap();
        assert!(cli.reset_history);
        assert!(cli.resume.is_none());

        let mut config = AppConfig::default();
        config.agent.max_steps = 7;
        cli.apply_to(&mut config);
        assert_eq!(config.agent.max_steps, 7);
        assert_eq!(config.agent.save_history, SaveHistory::Ask);
    }
}

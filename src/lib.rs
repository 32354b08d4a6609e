pub mod agent_engine;
pub mod cli;
pub mod config;
pub mod device;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod perception;

use std::sync::Arc;

use crate::agent_engine::decision::DecisionClient;
use crate::agent_engine::engine::TaskRunner;
use crate::agent_engine::feedback::ConsoleFeedback;
use crate::agent_engine::history::{default_history_dir, ConversationHistory};
use crate::agent_engine::state::{LoopConfig, TaskReport};
use crate::cli::Cli;
use crate::config::{AppConfig, SaveHistory};
use crate::device::adb::AdbDriver;
use crate::errors::TouchPilotResult;

/// Process exit code: task concluded successfully.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code: task ended in any other terminal state.
pub const EXIT_INCOMPLETE: i32 = 1;
/// Process exit code: configuration, device or I/O failure.
pub const EXIT_FATAL: i32 = 2;

/// Entry point of the binary. Returns the process exit code.
pub async fn run(cli: Cli) -> i32 {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run_task(&cli).await {
        Ok(report) if report.state.is_success() => EXIT_SUCCESS,
        Ok(_) => EXIT_INCOMPLETE,
        Err(e) => {
            tracing::error!(error = %e, "touchpilot failed");
            eprintln!("error: {e}");
            EXIT_FATAL
        }
    }
}

async fn run_task(cli: &Cli) -> TouchPilotResult<TaskReport> {
    let mut config = config::load_config(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    let provider = llm::provider_from_config(&config)?;
    let client = DecisionClient::new(provider, config.prompts.system_template.as_deref())?;
    let driver =
        AdbDriver::connect(config.device.adb_path.clone(), config.device.serial.clone()).await?;

    let mut history = match &cli.resume {
        Some(path) => ConversationHistory::load(path)?,
        None => ConversationHistory::new(),
    };
    if cli.reset_history {
        history.reset();
    }
    let mut history = history
        .with_limit(config.agent.history_limit)
        .with_screenshot_label(config.prompts.screenshot_label.clone());

    let console = Arc::new(ConsoleFeedback::stdin());
    let runner = TaskRunner::new(
        Arc::new(driver),
        client,
        console.clone(),
        LoopConfig {
            max_steps: config.agent.max_steps,
            settle_ms: config.device.settle_ms,
            max_image_edge: config.device.max_image_edge,
        },
    );

    let outcome = runner.run(&cli.task, &mut history).await;
    // History is worth keeping even when the run aborted.
    if let Err(e) = save_history(&config, &history, &console).await {
        tracing::warn!(error = %e, "conversation history not saved");
    }

    let report = outcome?;
    println!("[step {}] {}", report.step, report.state.describe());
    Ok(report)
}

async fn save_history(
    config: &AppConfig,
    history: &ConversationHistory,
    console: &ConsoleFeedback,
) -> TouchPilotResult<()> {
    if history.is_empty() {
        return Ok(());
    }
    let save = match config.agent.save_history {
        SaveHistory::Always => true,
        SaveHistory::Never => false,
        SaveHistory::Ask => console.confirm("Save conversation history?").await?,
    };
    if save {
        let dir = config.agent.history_dir.clone().unwrap_or_else(default_history_dir);
        let path = history.save_to_dir(&dir)?;
        println!("Conversation history saved to {}", path.display());
    }
    Ok(())
}

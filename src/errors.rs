use thiserror::Error;

#[derive(Debug, Error)]
pub enum TouchPilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The decision service replied, but the reply is not a valid action.
    #[error("Malformed action: {0}")]
    MalformedAction(String),

    /// Transport failure, timeout, non-2xx status or an undecodable body.
    #[error("Decision service unavailable: {0}")]
    DecisionUnavailable(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Perception error: {0}")]
    Perception(String),

    #[error("Feedback error: {0}")]
    Feedback(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Task aborted at step {step}: {source}")]
    Aborted {
        step: u32,
        #[source]
        source: Box<TouchPilotError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl TouchPilotError {
    /// Errors that end the task as a stall rather than a crash.
    pub fn is_decision_failure(&self) -> bool {
        matches!(
            self,
            TouchPilotError::MalformedAction(_) | TouchPilotError::DecisionUnavailable(_)
        )
    }
}

pub type TouchPilotResult<T> = Result<T, TouchPilotError>;

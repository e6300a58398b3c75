use thiserror::Error;

use crate::run::Stage;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid redaction rule `{pattern}`: {reason}")]
    RedactionRule { pattern: String, reason: String },

    #[error("Redacted text still matches built-in rule {0}")]
    RedactionLeak(String),

    #[error("Docker unavailable: {0}")]
    DockerUnavailable(String),

    #[error("Summary request failed: {0}")]
    SummaryRequest(String),

    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    #[error("Scheduler install failed: {0}")]
    SchedulerInstall(String),

    #[error("Run state error: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes, distinct per failure cause so scheduler logs can tell
/// them apart.
pub mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const UNEXPECTED: u8 = 1;
    pub const CONFIG: u8 = 2;
    pub const COLLECTION: u8 = 3;
    pub const REDACTION: u8 = 4;
    pub const SUMMARY: u8 = 5;
    pub const EMAIL: u8 = 6;
    pub const SCHEDULER: u8 = 7;
    pub const RUN_STATE: u8 = 8;
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::RedactionRule { .. } => exit_code::CONFIG,
            Self::DockerUnavailable(_) => exit_code::COLLECTION,
            Self::RedactionLeak(_) => exit_code::REDACTION,
            Self::SummaryRequest(_) => exit_code::SUMMARY,
            Self::EmailDelivery(_) => exit_code::EMAIL,
            Self::SchedulerInstall(_) => exit_code::SCHEDULER,
            Self::State(_) => exit_code::RUN_STATE,
            Self::Io(_) | Self::Other(_) => exit_code::UNEXPECTED,
        }
    }

    /// Stage of a run this error is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::DockerUnavailable(_) => Stage::Collecting,
            Self::RedactionLeak(_) | Self::RedactionRule { .. } => Stage::Redacting,
            Self::SummaryRequest(_) => Stage::Summarizing,
            Self::EmailDelivery(_) => Stage::Emailing,
            _ => Stage::Idle,
        }
    }
}

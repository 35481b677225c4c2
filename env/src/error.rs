use std::path::PathBuf;

use sdgym_client::SessionError;
use thiserror::Error;

/// Errors surfaced by the environment facade
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("environment not ready, call reset() first")]
    NotReady,

    #[error("episode is done, call reset() to start a new one")]
    EpisodeDone,

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no legal action at the current decision point")]
    NoLegalAction,

    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// An action index that cannot be played at the current decision point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidAction {
    #[error("action {index} is outside the action space of size {n}")]
    OutOfRange { index: usize, n: usize },

    #[error("action {index} is masked at this decision point")]
    Masked { index: usize },
}

impl InvalidAction {
    pub fn index(&self) -> usize {
        match self {
            InvalidAction::OutOfRange { index, .. } | InvalidAction::Masked { index } => *index,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid team_size {0} (must be 1 to 6)")]
    TeamSize(usize),

    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

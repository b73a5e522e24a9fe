use crate::config::ConfigError;
use localize_pipe_mt::MtError;
use std::path::PathBuf;

/// Errors surfaced by the session layer and the command-line front end
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Project directory not found: {}", .0.display())]
    ProjectMissing(PathBuf),
    #[error("Unsupported locale tag '{0}'")]
    InvalidLocale(String),
    #[error("No translated locale entries found for key '{0}'")]
    KeyNotFound(String),
    #[error(transparent)]
    Translation(#[from] MtError),
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

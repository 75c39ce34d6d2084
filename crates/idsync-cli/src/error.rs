use std::io;

use idsync_core::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] idsync_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("User ID cannot be empty")]
    EmptyUserId,
    #[error("Display name cannot be empty")]
    EmptyDisplayName,
    #[error("User not found: {0}")]
    UserNotFound(String),
}

//! Error types for idsync-core

use thiserror::Error;

/// Result type alias using idsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in idsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory user not found
    #[error("User not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Upstream directory rejected or failed a listing request
    #[error("Upstream directory error: {0}")]
    Upstream(String),

    /// Transport-level failure talking to the upstream directory
    #[error("Upstream HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

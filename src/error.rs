//! Error types for composedeck

use thiserror::Error;

/// Result type for composedeck operations
pub type Result<T> = std::result::Result<T, DeckError>;

/// composedeck error types
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Compose file parse error: {0}")]
    ComposeParse(String),

    #[error("Invalid compose command: {0}")]
    InvalidCommand(String),

    #[error("Failed to execute command: {0}")]
    Spawn(String),

    #[error("Command timed out after {0} seconds")]
    Timeout(u64),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

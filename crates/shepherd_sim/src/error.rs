//! Error types for session setup and stepping

use thiserror::Error;

/// Session errors. Per-tick agent behaviour never produces these; they come
/// from configuration and from driving a finished session.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    /// Reading a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid TOML for a session
    #[error("Failed to parse session configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serializing a snapshot failed
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The session already ended in a win or loss
    #[error("Session has ended")]
    SessionEnded,
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SimError>;

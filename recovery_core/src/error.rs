//! Error types for the recovery_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for recovery_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an out-of-range or malformed value
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A record addressed by id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Assistant provider failure (network, HTTP status, bad payload)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Patient record store error
    #[error("State error: {0}")]
    State(String),
}

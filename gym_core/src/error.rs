//! Error types for the gym_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gym_core operations
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

    /// A record failed validation (bad preference value, empty routine name, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced routine, session, exercise or set does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Active workout state error
    #[error("State error: {0}")]
    State(String),

    /// The adapter does not support this operation on its platform
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A platform adapter failed (auth, payment, ads, remote storage)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

//! Error types for the liftlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftlog_core operations
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

    /// Unsupported import file type
    #[error("Unsupported file type: {0}. Please select a CSV or JSON file.")]
    Format(String),

    /// Import content could not be parsed
    #[error("Failed to parse file: {0}")]
    Parse(String),

    /// Export requested for an empty collection
    #[error("{0}")]
    NoData(String),

    /// Invalid user input for a journal entry
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored state is unreadable
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

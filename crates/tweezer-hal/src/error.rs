//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur in device operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Program exceeds device capabilities.
    #[error("Program exceeds device capabilities: {0}")]
    CircuitTooLarge(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// The schedule cannot be executed as given.
    #[error("Invalid program: {0}")]
    InvalidProgram(String),

    /// Unsupported feature or gate.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic device error.
    #[error("Device error: {0}")]
    Backend(String),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;

//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur while prompting a brain.
#[derive(Debug, Error)]
pub enum BrainError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never reached the model.
    #[error("network error: {0}")]
    Network(String),

    /// The brain is temporarily unavailable.
    #[error("brain unavailable: {0}")]
    Unavailable(String),

    /// The model rejected or failed the request.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The reply did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A timeout occurred during processing.
    #[error("processing timed out")]
    Timeout,
}

//! Error types for pipeline operations.

use brain_core::BrainError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while publishing or handling pipeline events.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Store read or write failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Language model call failed.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// Event payload did not match its schema.
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Event name is not in the catalogue.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A directory, contact or tech-stack provider failed.
    #[error("provider {provider} failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// Handler received an event it does not handle.
    #[error("handler {handler} cannot handle {event}")]
    UnexpectedEvent {
        handler: &'static str,
        event: &'static str,
    },

    /// The dispatcher is shutting down.
    #[error("dispatcher shut down")]
    ShutDown,
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

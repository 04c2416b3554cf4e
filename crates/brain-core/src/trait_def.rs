//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::request::{Completion, CompletionRequest};

/// A trait for sending a prompt to a language model and getting text back.
///
/// Implementations range from scripted test doubles to hosted model clients.
/// This trait is object-safe and can be used with `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Complete a single-turn prompt.
    ///
    /// # Returns
    ///
    /// The model's reply text, or an error if the request failed.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to take requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

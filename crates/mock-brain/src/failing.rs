//! Failing brain implementation - every call errors.

use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, Brain, BrainError, Completion, CompletionRequest};

/// A brain whose every completion fails.
///
/// Useful for testing that callers fall back when the model is down.
#[derive(Debug, Default)]
pub struct FailingBrain {
    message: String,
    calls: AtomicUsize,
}

impl FailingBrain {
    /// Create a brain that fails with a generic message.
    pub fn new() -> Self {
        Self::with_message("scripted failure")
    }

    /// Create a brain that fails with the given message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completions attempted.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn complete(&self, _request: CompletionRequest) -> Result<Completion, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BrainError::ProcessingFailed(self.message.clone()))
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_fails() {
        let brain = FailingBrain::with_message("API error (529): Overloaded");

        let err = brain.complete(CompletionRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.to_string(), "processing failed: API error (529): Overloaded");
        assert!(brain.complete(CompletionRequest::new("again")).await.is_err());
        assert_eq!(brain.call_count(), 2);
        assert!(!brain.is_ready().await);
    }
}

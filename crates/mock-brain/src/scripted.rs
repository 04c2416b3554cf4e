//! Scripted brain implementation - replies from a script.

use std::collections::VecDeque;

use brain_core::{async_trait, Brain, BrainError, Completion, CompletionRequest};
use tokio::sync::Mutex;

/// A brain that answers from a queue of canned replies.
///
/// Replies are handed out in order; once the queue is down to its last entry
/// that entry is repeated. Every prompt is recorded for later assertions.
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBrain {
    /// Create a brain that replies with each entry in turn.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a brain that always gives the same reply.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::ScriptedBrain;
    ///
    /// let brain = ScriptedBrain::always("no json here");
    /// // Every completion returns "no json here"
    /// ```
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new([reply.into()])
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.prompts.lock().await.clone()
    }

    /// Number of completions served.
    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
        self.prompts.lock().await.push(request);

        let mut replies = self.replies.lock().await;
        let text = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
        .ok_or_else(|| BrainError::Unavailable("script is empty".to_string()))?;

        Ok(Completion::new(text, "scripted"))
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_repeats_last() {
        let brain = ScriptedBrain::new(["first", "second"]);

        let a = brain.complete(CompletionRequest::new("1")).await.unwrap();
        let b = brain.complete(CompletionRequest::new("2")).await.unwrap();
        let c = brain.complete(CompletionRequest::new("3")).await.unwrap();

        assert_eq!(a.text, "first");
        assert_eq!(b.text, "second");
        assert_eq!(c.text, "second");
        assert_eq!(brain.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_records_requests() {
        let brain = ScriptedBrain::always("ok");
        brain
            .complete(CompletionRequest::new("Score Acme").with_max_tokens(500))
            .await
            .unwrap();

        let requests = brain.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "Score Acme");
        assert_eq!(requests[0].max_tokens, Some(500));
    }

    #[tokio::test]
    async fn test_empty_script_is_unavailable() {
        let brain = ScriptedBrain::default();
        let err = brain.complete(CompletionRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, BrainError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_concurrent_calls() {
        use std::sync::Arc;

        let brain = Arc::new(ScriptedBrain::always("same"));
        let calls = (0..10).map(|i| {
            let brain = brain.clone();
            async move { brain.complete(CompletionRequest::new(format!("p{i}"))).await }
        });

        let results = futures::future::join_all(calls).await;
        assert!(results.iter().all(|r| matches!(r, Ok(c) if c.text == "same")));
        assert_eq!(brain.call_count().await, 10);
    }
}

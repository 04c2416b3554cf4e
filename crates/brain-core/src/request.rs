//! Prompt and reply types.

use serde::{Deserialize, Serialize};

/// A single-turn prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The user prompt.
    pub prompt: String,
    /// Upper bound on reply tokens. Brains fall back to their configured
    /// default when unset.
    pub max_tokens: Option<u32>,
    /// Optional system prompt.
    pub system: Option<String>,
}

impl CompletionRequest {
    /// Create a request with no token limit or system prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            system: None,
        }
    }

    /// Set the reply token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// A model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Concatenated text content of the reply.
    pub text: String,
    /// Model that produced the reply.
    pub model: String,
}

impl Completion {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("score this")
            .with_max_tokens(500)
            .with_system("You are terse.");
        assert_eq!(request.prompt, "score this");
        assert_eq!(request.max_tokens, Some(500));
        assert_eq!(request.system.as_deref(), Some("You are terse."));
    }
}

//! Mock brain implementations for pipeline tests.
//!
//! This crate provides mock implementations of the `Brain` trait for testing:
//! - `ScriptedBrain` - Replies with canned text and records prompts
//! - `FailingBrain` - Always fails, to exercise fallbacks
//!
//! For hosted model processing, use the `claude-brain` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, CompletionRequest, ScriptedBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = ScriptedBrain::always(r#"{"score": 85, "tier": "A"}"#);
//!
//!     let reply = brain.complete(CompletionRequest::new("Score this lead")).await?;
//!     println!("Reply: {}", reply.text);
//!     Ok(())
//! }
//! ```

mod failing;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, Completion, CompletionRequest};

// Export mock implementations
pub use failing::FailingBrain;
pub use scripted::ScriptedBrain;

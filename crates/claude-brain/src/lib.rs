//! Anthropic Claude brain implementation.
//!
//! This crate provides a brain implementation that sends single-turn prompts
//! to the Anthropic Messages API. The pipeline uses it for lead scoring and
//! outreach copywriting; without an API key the pipeline runs its
//! deterministic fallbacks instead.
//!
//! # Usage
//!
//! ```rust,no_run
//! use claude_brain::{Brain, ClaudeBrain, CompletionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = ClaudeBrain::from_env()?;
//!     let reply = brain
//!         .complete(CompletionRequest::new("Say hello").with_max_tokens(50))
//!         .await?;
//!     println!("{}", reply.text);
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::ClaudeBrain;
pub use config::{ClaudeBrainConfig, ClaudeBrainConfigBuilder};

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, Completion, CompletionRequest};

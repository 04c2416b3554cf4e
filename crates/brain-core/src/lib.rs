//! Core trait and types for brain implementations.
//!
//! This crate provides the shared interface for the language-model backends
//! the Tapflow pipeline prompts for lead scoring and email copywriting. It
//! defines:
//!
//! - [`Brain`] - The trait that all brain implementations must implement
//! - [`CompletionRequest`] / [`Completion`] - Prompt and reply types
//! - [`BrainError`] - Error types for brain operations
//! - [`parse_json_object`] - Pulls the JSON object out of a free-text reply
//!
//! # Example
//!
//! ```rust
//! use brain_core::{Brain, BrainError, Completion, CompletionRequest};
//! use async_trait::async_trait;
//!
//! struct MyBrain;
//!
//! #[async_trait]
//! impl Brain for MyBrain {
//!     async fn complete(&self, _request: CompletionRequest) -> Result<Completion, BrainError> {
//!         Ok(Completion::new(r#"{"score": 90, "tier": "A"}"#, "my-model"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyBrain"
//!     }
//! }
//! ```

mod error;
mod json;
mod request;
mod trait_def;

pub use error::BrainError;
pub use json::{extract_json_object, parse_json_object};
pub use request::{Completion, CompletionRequest};
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

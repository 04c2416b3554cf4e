//! ClaudeBrain implementation using the Anthropic Messages API.

use brain_core::{async_trait, Brain, BrainError, Completion, CompletionRequest};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{ApiError, Message, MessagesRequest, MessagesResponse};
use crate::config::ClaudeBrainConfig;

/// Default HTTP timeout for API requests (60 seconds).
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// A brain implementation that prompts Claude through the Messages API.
///
/// Each call is a single-turn conversation; no history is kept between calls.
pub struct ClaudeBrain {
    client: Client,
    config: ClaudeBrainConfig,
}

impl ClaudeBrain {
    /// Create a new ClaudeBrain with the given configuration.
    pub fn new(config: ClaudeBrainConfig) -> Result<Self, BrainError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!("ClaudeBrain initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create a ClaudeBrain from environment variables.
    ///
    /// See [`ClaudeBrainConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        let config = ClaudeBrainConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClaudeBrainConfig {
        &self.config
    }

    fn build_request(&self, request: CompletionRequest) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            messages: vec![Message::user(request.prompt)],
            system: request.system,
            temperature: self.config.temperature,
        }
    }

    /// Make a request to the Messages API.
    async fn create_message(&self, request: MessagesRequest) -> Result<MessagesResponse, BrainError> {
        let url = format!("{}/v1/messages", self.config.api_url.trim_end_matches('/'));

        debug!("Sending request to Anthropic API: model={}, max_tokens={}", request.model, request.max_tokens);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrainError::Timeout
                } else {
                    BrainError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(BrainError::ProcessingFailed(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message
                )));
            }

            return Err(BrainError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let message: MessagesResponse = response
            .json()
            .await
            .map_err(|e| BrainError::ProcessingFailed(format!("Failed to parse response: {}", e)))?;

        if let Some(ref usage) = message.usage {
            debug!(
                "Token usage - input: {}, output: {}, stop_reason: {:?}",
                usage.input_tokens, usage.output_tokens, message.stop_reason
            );
        }

        Ok(message)
    }
}

#[async_trait]
impl Brain for ClaudeBrain {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, BrainError> {
        let request = self.build_request(request);
        let message = self.create_message(request).await?;

        let text = message.text();
        if text.trim().is_empty() {
            return Err(BrainError::InvalidResponse(format!(
                "no text content in message {}",
                message.id
            )));
        }

        Ok(Completion::new(text, message.model))
    }

    fn name(&self) -> &str {
        "ClaudeBrain"
    }

    async fn is_ready(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}

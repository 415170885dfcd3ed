//! LLM provider abstractions for narrador-runtime.
//!
//! This module defines the trait every provider adapter implements and the
//! single concrete adapter, which speaks the OpenAI chat-completions format
//! shared by Groq and OpenAI.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling.
//! See [`ApiCredential`] for the recommended patterns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

use narrador_core::{normalize_value, StoryOutput};

mod factory;
mod openai;
pub mod secrets;

pub use factory::{ProviderFactory, ProviderRegistry, ProviderSettings};
pub use openai::{
    Endpoint, GroqProviderFactory, OpenAiCompatibleProvider, OpenAiProviderFactory, GROQ,
    OPENAI,
};
pub use secrets::{ApiCredential, CredentialSource};

/// Errors from LLM providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Per-provider call settings.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content (empty when the provider returned no choices)
    pub content: String,

    /// Usage report exactly as the provider sent it
    pub usage: JsonValue,

    /// Model that served the request
    pub model: String,
}

/// Text plus raw usage produced by one provider for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    /// Registered provider name ("groq", "openai")
    pub provider: String,

    /// Model that served the request
    pub model: String,

    /// Generated text
    pub text: String,

    /// Raw usage; run it through the normalizer before storing
    pub usage: JsonValue,
}

impl ProviderResult {
    /// True when the provider produced something worth keeping.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Stored/returned shape: text plus normalized usage.
    pub fn story_output(&self) -> StoryOutput {
        StoryOutput {
            historia: self.text.clone(),
            tokens: normalize_value(self.usage.clone()),
        }
    }
}

/// Provider abstraction allows swapping LLM backends.
///
/// One call per invocation, no retries: the caller decides whether a
/// failure is fatal.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(&self, messages: Vec<ChatMessage>)
        -> Result<CompletionResponse, ProviderError>;

    /// Check if provider is usable. Reported by the health endpoint.
    async fn health_check(&self) -> bool;

    /// Registered provider name.
    fn name(&self) -> &str;

    /// Configured model identifier.
    fn model(&self) -> &str;

    /// Send `prompt` as a single user message.
    async fn generate(&self, prompt: &str) -> Result<ProviderResult, ProviderError> {
        let response = self.complete(vec![ChatMessage::user(prompt)]).await?;
        Ok(ProviderResult {
            provider: self.name().to_string(),
            model: response.model,
            text: response.content,
            usage: response.usage,
        })
    }
}

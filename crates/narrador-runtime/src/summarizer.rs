//! Single-call summaries. Nothing is persisted.

use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

use narrador_core::{normalize_value, prompts, SummaryRequest, SummaryResult};

use crate::executor::PromptExecutor;
use crate::providers::{LlmProvider, ProviderError, OPENAI};

/// Errors from summarization.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Summary provider is not configured")]
    NotConfigured,

    #[error("Summary provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Summary provider returned an empty summary")]
    EmptySummary,
}

/// Summarizes text with one provider.
pub struct Summarizer {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl Summarizer {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { provider }
    }

    /// Summarizer backed by the executor's OpenAI adapter, if any.
    pub fn from_executor(executor: &PromptExecutor) -> Self {
        Self::new(executor.provider(OPENAI))
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Plain summary.
    pub async fn basic(&self, request: &SummaryRequest) -> Result<SummaryResult, SummaryError> {
        tracing::info!(texto = %request.preview(), "Summarizing text");
        self.summarize(&prompts::summary_prompt(request)).await
    }

    /// Summary of the requested size plus keywords and sentiment.
    pub async fn advanced(&self, request: &SummaryRequest) -> Result<SummaryResult, SummaryError> {
        tracing::info!(
            texto = %request.preview(),
            tamanho = %request.tamanho,
            "Summarizing text with keywords and sentiment"
        );
        self.summarize(&prompts::advanced_summary_prompt(request)).await
    }

    async fn summarize(&self, prompt: &str) -> Result<SummaryResult, SummaryError> {
        let provider = self.provider.as_ref().ok_or(SummaryError::NotConfigured)?;

        let started = Instant::now();
        let result = provider.generate(prompt).await.inspect_err(|e| {
            tracing::warn!(provider = provider.name(), error = %e, "Summary call failed");
        })?;
        let latency = started.elapsed();

        if !result.has_content() {
            return Err(SummaryError::EmptySummary);
        }

        Ok(SummaryResult {
            summary: result.text,
            latency,
            usage: normalize_value(result.usage),
        })
    }
}

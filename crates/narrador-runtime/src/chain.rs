//! Draft-then-refine story chain.
//!
//! The chain runs two strictly sequential stages:
//! 1. The drafter writes a short sketch from the request parameters
//! 2. The refiner expands that sketch into the final story
//!
//! A missing draft stops the chain before the refiner is ever called.
//! Successful runs are appended to the story store before returning.

use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

use narrador_core::{
    normalize_value, prompts, ChainResult, EvolutionaryStoryRequest, NewStoryRecord,
};

use crate::executor::PromptExecutor;
use crate::providers::{ProviderError, GROQ, OPENAI};
use crate::store::{PersistenceError, StorySink};

/// Errors from the evolutionary chain.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Draft provider '{provider}' returned no usable draft")]
    DraftGenerationFailed {
        provider: String,
        #[source]
        cause: Option<ProviderError>,
    },

    #[error("Refinement provider '{0}' is not configured")]
    RefinerNotConfigured(String),

    #[error("Refinement failed: {0}")]
    Refinement(#[from] ProviderError),

    #[error("Failed to store story: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Chain not fully configured: {0}")]
    Incomplete(String),
}

/// Two-stage story generator.
pub struct EvolutionaryChain {
    executor: Arc<PromptExecutor>,
    drafter: String,
    refiner: String,
    sink: Arc<dyn StorySink>,
}

impl EvolutionaryChain {
    /// Chain with Groq drafting and OpenAI refining.
    pub fn new(executor: Arc<PromptExecutor>, sink: Arc<dyn StorySink>) -> Self {
        Self {
            executor,
            drafter: GROQ.to_string(),
            refiner: OPENAI.to_string(),
            sink,
        }
    }

    pub fn builder() -> EvolutionaryChainBuilder {
        EvolutionaryChainBuilder::new()
    }

    pub fn drafter(&self) -> &str {
        &self.drafter
    }

    pub fn refiner(&self) -> &str {
        &self.refiner
    }

    /// Run both stages and store the outcome.
    pub async fn run(
        &self,
        request: &EvolutionaryStoryRequest,
    ) -> Result<ChainResult, ChainError> {
        tracing::info!(
            tema = %request.tema,
            estilo = %request.estilo,
            genero = %request.genero,
            extensao = %request.extensao,
            "Generating evolutionary story"
        );

        // Stage 1: draft
        let started = Instant::now();
        let mut drafts = self
            .executor
            .execute_on(&prompts::draft_prompt(request), &[self.drafter.as_str()])
            .await;
        let draft_latency = started.elapsed();

        let draft = match drafts.remove(&self.drafter) {
            Some(Ok(result)) if result.has_content() => result.text,
            outcome => {
                tracing::warn!(provider = %self.drafter, "Draft stage produced nothing");
                return Err(ChainError::DraftGenerationFailed {
                    provider: self.drafter.clone(),
                    cause: outcome.and_then(Result::err),
                });
            }
        };
        tracing::debug!(provider = %self.drafter, elapsed = ?draft_latency, "Draft ready");

        // Stage 2: refine
        let refiner = self
            .executor
            .provider(&self.refiner)
            .ok_or_else(|| ChainError::RefinerNotConfigured(self.refiner.clone()))?;

        let started = Instant::now();
        let refined = refiner
            .generate(&prompts::refine_prompt(&draft))
            .await
            .inspect_err(|e| {
                tracing::warn!(provider = %self.refiner, error = %e, "Refinement failed");
            })?;
        let refine_latency = started.elapsed();
        tracing::debug!(provider = %self.refiner, elapsed = ?refine_latency, "Refinement ready");

        let result = ChainResult {
            draft,
            final_text: refined.text,
            draft_latency,
            refine_latency,
            usage: normalize_value(refined.usage),
        };

        let stored = self
            .sink
            .append(NewStoryRecord::from_chain(request.tema.clone(), &result))
            .await?;
        tracing::info!(id = stored.id, "Evolutionary story stored");

        Ok(result)
    }
}

impl std::fmt::Debug for EvolutionaryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionaryChain")
            .field("drafter", &self.drafter)
            .field("refiner", &self.refiner)
            .field("executor", &self.executor)
            .finish()
    }
}

/// Builder for EvolutionaryChain.
pub struct EvolutionaryChainBuilder {
    executor: Option<Arc<PromptExecutor>>,
    sink: Option<Arc<dyn StorySink>>,
    drafter: String,
    refiner: String,
}

impl EvolutionaryChainBuilder {
    pub fn new() -> Self {
        Self {
            executor: None,
            sink: None,
            drafter: GROQ.to_string(),
            refiner: OPENAI.to_string(),
        }
    }

    /// Set the executor that owns the providers.
    pub fn executor(mut self, executor: Arc<PromptExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Set where finished stories go.
    pub fn sink(mut self, sink: Arc<dyn StorySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Provider name for stage 1.
    pub fn drafter(mut self, name: impl Into<String>) -> Self {
        self.drafter = name.into();
        self
    }

    /// Provider name for stage 2.
    pub fn refiner(mut self, name: impl Into<String>) -> Self {
        self.refiner = name.into();
        self
    }

    pub fn build(self) -> Result<EvolutionaryChain, ChainError> {
        let executor = self
            .executor
            .ok_or_else(|| ChainError::Incomplete("No executor set".to_string()))?;
        let sink = self
            .sink
            .ok_or_else(|| ChainError::Incomplete("No story sink set".to_string()))?;

        Ok(EvolutionaryChain {
            executor,
            drafter: self.drafter,
            refiner: self.refiner,
            sink,
        })
    }
}

impl Default for EvolutionaryChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Single-prompt story generation across every configured provider.

use std::sync::Arc;
use thiserror::Error;

use narrador_core::{prompts, BasicStory, NewStoryRecord, StoryOutputs, StoryRequest};

use crate::executor::PromptExecutor;
use crate::providers::{GROQ, OPENAI};
use crate::store::{PersistenceError, StorySink};

/// Errors from basic story generation.
#[derive(Error, Debug)]
pub enum StoryError {
    #[error("No provider returned usable content")]
    NoContent,

    #[error("Failed to store story: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Asks every provider for a story on the same topic and stores the answers.
pub struct StoryGenerator {
    executor: Arc<PromptExecutor>,
    sink: Arc<dyn StorySink>,
}

impl StoryGenerator {
    pub fn new(executor: Arc<PromptExecutor>, sink: Arc<dyn StorySink>) -> Self {
        Self { executor, sink }
    }

    pub async fn generate(&self, request: &StoryRequest) -> Result<BasicStory, StoryError> {
        tracing::info!(tema = %request.tema, "Generating story");

        let results = self.executor.execute(&prompts::story_prompt(request)).await;
        let story = BasicStory {
            historia: StoryOutputs {
                groq: results.get(GROQ).map(|r| r.story_output()),
                openai: results.get(OPENAI).map(|r| r.story_output()),
            },
        };

        if story.is_empty() {
            return Err(StoryError::NoContent);
        }

        let stored = self
            .sink
            .append(NewStoryRecord::from_story(request.tema.clone(), &story))
            .await?;
        tracing::info!(id = stored.id, "Story stored");

        Ok(story)
    }
}

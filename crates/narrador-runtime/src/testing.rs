//! Scripted providers and in-memory sinks shared by the unit tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use narrador_core::{NewStoryRecord, StoryRecord};

use crate::providers::{ChatMessage, CompletionResponse, LlmProvider, ProviderError};
use crate::store::{PersistenceError, StorySink};

pub(crate) fn sample_usage() -> JsonValue {
    json!({
        "prompt_tokens": 12,
        "completion_tokens": 52,
        "total_tokens": 64,
        "prompt_tokens_details": null
    })
}

enum Reply {
    Text(String),
    Fail,
}

/// Provider that answers every call the same way after an optional delay.
pub(crate) struct ScriptedProvider {
    name: &'static str,
    reply: Reply,
    delay: Duration,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub(crate) fn replying(name: &'static str, text: impl Into<String>) -> Self {
        Self::with_reply(name, Reply::Text(text.into()))
    }

    pub(crate) fn failing(name: &'static str) -> Self {
        Self::with_reply(name, Reply::Fail)
    }

    fn with_reply(name: &'static str, reply: Reply) -> Self {
        Self {
            name,
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = messages.last() {
            self.prompts.lock().push(message.content.clone());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            Reply::Text(text) => Ok(CompletionResponse {
                content: text.clone(),
                usage: sample_usage(),
                model: format!("{}-model", self.name),
            }),
            Reply::Fail => Err(ProviderError::ApiError {
                status: 503,
                message: "service unavailable".to_string(),
            }),
        }
    }

    async fn health_check(&self) -> bool {
        matches!(self.reply, Reply::Text(_))
    }

    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Sink keeping records in memory.
#[derive(Default)]
pub(crate) struct MemorySink {
    records: Mutex<Vec<StoryRecord>>,
}

impl MemorySink {
    pub(crate) fn records(&self) -> Vec<StoryRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl StorySink for MemorySink {
    async fn append(&self, record: NewStoryRecord) -> Result<StoryRecord, PersistenceError> {
        let mut records = self.records.lock();
        let stored = StoryRecord {
            id: records.len() as i64 + 1,
            created_at: Utc::now(),
            prompt: record.prompt,
            provider_a_output: record.provider_a_output,
            provider_b_output: record.provider_b_output,
        };
        records.push(stored.clone());
        Ok(stored)
    }
}

/// Sink that always fails.
pub(crate) struct FailingSink;

#[async_trait]
impl StorySink for FailingSink {
    async fn append(&self, _record: NewStoryRecord) -> Result<StoryRecord, PersistenceError> {
        Err(PersistenceError::Join("disk on fire".to_string()))
    }
}

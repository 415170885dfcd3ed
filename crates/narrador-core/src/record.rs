//! Results handed back to callers and records handed to the store.
//!
//! Serialized field names match the public JSON contract (`esboco`,
//! `resumo`, `tempo`, ...). Latencies are carried as [`Duration`] and
//! serialized as floating-point seconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use crate::usage::UsageMap;

/// Outcome of the draft-then-refine chain. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainResult {
    /// Stage 1 output
    #[serde(rename = "esboco")]
    pub draft: String,

    /// Stage 2 output
    #[serde(rename = "historia_evolutiva")]
    pub final_text: String,

    /// Wall-clock time of the draft call
    #[serde(rename = "tempo_groq", with = "duration_secs")]
    pub draft_latency: Duration,

    /// Wall-clock time of the refinement call
    #[serde(rename = "tempo_openai", with = "duration_secs")]
    pub refine_latency: Duration,

    /// Normalized usage of the refinement call
    #[serde(rename = "tokens_openai")]
    pub usage: UsageMap,
}

impl ChainResult {
    /// Stored shape of the draft stage.
    pub fn draft_output(&self) -> JsonValue {
        json!({
            "esboco": self.draft,
            "tempo": self.draft_latency.as_secs_f64(),
        })
    }

    /// Stored shape of the refinement stage.
    pub fn refine_output(&self) -> JsonValue {
        json!({
            "historia_final": self.final_text,
            "tokens": self.usage,
            "tempo": self.refine_latency.as_secs_f64(),
        })
    }
}

/// Outcome of a single-stage summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    #[serde(rename = "resumo")]
    pub summary: String,

    #[serde(rename = "tempo", with = "duration_secs")]
    pub latency: Duration,

    #[serde(rename = "tokens")]
    pub usage: UsageMap,
}

/// One provider's contribution to a basic story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryOutput {
    pub historia: String,
    pub tokens: UsageMap,
}

/// Per-provider outputs of a basic story; absent providers serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryOutputs {
    #[serde(rename = "Groq")]
    pub groq: Option<StoryOutput>,

    #[serde(rename = "OpenAI")]
    pub openai: Option<StoryOutput>,
}

/// Response of the basic story flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStory {
    pub historia: StoryOutputs,
}

impl BasicStory {
    pub fn is_empty(&self) -> bool {
        self.historia.groq.is_none() && self.historia.openai.is_none()
    }
}

/// A record about to be appended; id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStoryRecord {
    /// The user's topic
    pub prompt: String,

    /// Draft/first provider output (JSON `null` when absent)
    pub provider_a_output: JsonValue,

    /// Refiner/second provider output (JSON `null` when absent)
    pub provider_b_output: JsonValue,
}

impl NewStoryRecord {
    pub fn from_chain(tema: impl Into<String>, result: &ChainResult) -> Self {
        Self {
            prompt: tema.into(),
            provider_a_output: result.draft_output(),
            provider_b_output: result.refine_output(),
        }
    }

    pub fn from_story(tema: impl Into<String>, story: &BasicStory) -> Self {
        let to_json = |output: &Option<StoryOutput>| match output {
            Some(output) => json!(output),
            None => JsonValue::Null,
        };
        Self {
            prompt: tema.into(),
            provider_a_output: to_json(&story.historia.groq),
            provider_b_output: to_json(&story.historia.openai),
        }
    }
}

/// A persisted story record. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub prompt: String,
    pub provider_a_output: JsonValue,
    pub provider_b_output: JsonValue,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

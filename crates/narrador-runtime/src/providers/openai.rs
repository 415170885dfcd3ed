//! OpenAI-compatible chat-completions provider.
//!
//! Groq exposes the same wire format as OpenAI under a different base URL,
//! so a single adapter serves both. Each service gets its own
//! [`Endpoint`] (defaults) and factory.
//!
//! ## Security
//!
//! The API key lives in an [`ApiCredential`] and is only exposed while
//! building the `Authorization` header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

use super::{
    factory::{ProviderFactory, ProviderSettings},
    secrets::ApiCredential,
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
};

/// Registered name of the Groq provider (draft generator).
pub const GROQ: &str = "groq";

/// Registered name of the OpenAI provider (refiner and summarizer).
pub const OPENAI: &str = "openai";

/// Static defaults of one OpenAI-compatible service.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub provider_type: &'static str,
    pub credential_name: &'static str,
    pub default_model: &'static str,
    pub default_base_url: &'static str,
}

impl Endpoint {
    pub const GROQ: Endpoint = Endpoint {
        provider_type: GROQ,
        credential_name: "Groq API key",
        default_model: "mixtral-8x7b-32768",
        default_base_url: "https://api.groq.com/openai/v1",
    };

    pub const OPENAI: Endpoint = Endpoint {
        provider_type: OPENAI,
        credential_name: "OpenAI API key",
        default_model: "gpt-4o-mini",
        default_base_url: "https://api.openai.com/v1",
    };
}

/// Adapter for any OpenAI-compatible chat-completions API.
pub struct OpenAiCompatibleProvider {
    name: &'static str,
    credential: ApiCredential,
    base_url: String,
    config: CompletionConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("name", &self.name)
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.config.model)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl OpenAiCompatibleProvider {
    /// Create a provider for `endpoint` with the given key and call settings.
    pub fn new(
        endpoint: &Endpoint,
        credential: ApiCredential,
        config: CompletionConfig,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        Ok(Self {
            name: endpoint.provider_type,
            credential,
            base_url: endpoint.default_base_url.to_string(),
            config,
            client,
        })
    }

    /// Create from settings, applying the endpoint's defaults.
    pub fn from_settings(
        endpoint: &Endpoint,
        settings: &ProviderSettings,
    ) -> Result<Self, ProviderError> {
        let credential = settings.credential.clone().ok_or_else(|| {
            ProviderError::NotConfigured(format!("{} not set", endpoint.credential_name))
        })?;

        let config = CompletionConfig {
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| endpoint.default_model.to_string()),
            timeout: settings.timeout,
            ..Default::default()
        };

        let provider = Self::new(endpoint, credential, config)?;
        Ok(match &settings.base_url {
            Some(url) => provider.with_base_url(url.clone()),
            None => provider,
        })
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: JsonValue,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: &messages,
        };

        tracing::debug!(provider = self.name, model = %self.config.model, "Calling provider");

        // SECURITY: Only expose the credential here, at the point of use
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.credential.expose())
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::AuthError);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);

            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.config.timeout)
            } else {
                ProviderError::ParseError(e.to_string())
            }
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage: body.usage,
            model: body.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    async fn health_check(&self) -> bool {
        // Verify the key is set without logging it
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn validate_settings(
    endpoint: &Endpoint,
    settings: &ProviderSettings,
) -> Result<(), ProviderError> {
    if !settings.is_configured() {
        return Err(ProviderError::NotConfigured(format!(
            "{} required",
            endpoint.credential_name
        )));
    }

    if let Some(url) = &settings.base_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ProviderError::NotConfigured(
                "base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if settings.timeout.is_zero() {
        return Err(ProviderError::NotConfigured(
            "timeout must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// Factory for the Groq draft provider.
pub struct GroqProviderFactory;

impl ProviderFactory for GroqProviderFactory {
    fn provider_type(&self) -> &'static str {
        GROQ
    }

    fn create(&self, settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.validate(settings)?;
        Ok(Arc::new(OpenAiCompatibleProvider::from_settings(
            &Endpoint::GROQ,
            settings,
        )?))
    }

    fn validate(&self, settings: &ProviderSettings) -> Result<(), ProviderError> {
        validate_settings(&Endpoint::GROQ, settings)
    }

    fn default_model(&self) -> &'static str {
        Endpoint::GROQ.default_model
    }
}

/// Factory for the OpenAI refine/summary provider.
pub struct OpenAiProviderFactory;

impl ProviderFactory for OpenAiProviderFactory {
    fn provider_type(&self) -> &'static str {
        OPENAI
    }

    fn create(&self, settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.validate(settings)?;
        Ok(Arc::new(OpenAiCompatibleProvider::from_settings(
            &Endpoint::OPENAI,
            settings,
        )?))
    }

    fn validate(&self, settings: &ProviderSettings) -> Result<(), ProviderError> {
        validate_settings(&Endpoint::OPENAI, settings)
    }

    fn default_model(&self) -> &'static str {
        Endpoint::OPENAI.default_model
    }
}

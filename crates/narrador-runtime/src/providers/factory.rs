//! Provider factory pattern for provider registration.
//!
//! Providers register factories that build instances from
//! [`ProviderSettings`]. The registry is what turns configuration into the
//! list of adapters the executor fans out to.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.create("groq", &settings)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::{ApiCredential, LlmProvider, ProviderError};

/// Settings for one provider, as read from configuration.
///
/// A provider participates only when `credential` is present.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// API key, if configured
    pub credential: Option<ApiCredential>,

    /// Model override; the factory default applies when unset
    pub model: Option<String>,

    /// Endpoint override; the factory default applies when unset
    pub base_url: Option<String>,

    /// Per-call timeout
    pub timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            credential: None,
            model: None,
            base_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ProviderSettings {
    /// Settings with just an API key.
    pub fn with_credential(credential: ApiCredential) -> Self {
        Self {
            credential: Some(credential),
            ..Default::default()
        }
    }

    /// Whether the provider should participate.
    pub fn is_configured(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Factory for creating LLM providers from settings.
pub trait ProviderFactory: Send + Sync {
    /// Unique identifier for this provider type ("groq", "openai").
    fn provider_type(&self) -> &'static str;

    /// Create a provider instance.
    fn create(&self, settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>, ProviderError>;

    /// Validate settings without creating a provider.
    fn validate(&self, settings: &ProviderSettings) -> Result<(), ProviderError>;

    /// Model used when the settings carry no override.
    fn default_model(&self) -> &'static str;
}

/// Registry of available provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory, replacing any with the same type.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories.insert(factory.provider_type().to_string(), factory);
    }

    /// Create a provider from type name and settings.
    pub fn create(
        &self,
        provider_type: &str,
        settings: &ProviderSettings,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.factory(provider_type)?.create(settings)
    }

    /// Validate settings for a provider type.
    pub fn validate(
        &self,
        provider_type: &str,
        settings: &ProviderSettings,
    ) -> Result<(), ProviderError> {
        self.factory(provider_type)?.validate(settings)
    }

    /// Build every provider whose settings carry a credential.
    ///
    /// Unconfigured providers are skipped silently; misconfigured ones
    /// (e.g. a bad base URL) are an error.
    pub fn create_configured<'a, 'b, I>(
        &self,
        settings: I,
    ) -> Result<Vec<Arc<dyn LlmProvider>>, ProviderError>
    where
        I: IntoIterator<Item = (&'a str, &'b ProviderSettings)>,
    {
        let mut providers = Vec::new();
        for (provider_type, settings) in settings {
            if !settings.is_configured() {
                tracing::info!(provider = provider_type, "No credential, provider disabled");
                continue;
            }
            let provider = self.create(provider_type, settings)?;
            tracing::info!(
                provider = provider_type,
                model = provider.model(),
                "Provider enabled"
            );
            providers.push(provider);
        }
        Ok(providers)
    }

    /// List available provider types.
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    /// Default model for a provider type.
    pub fn default_model(&self, provider_type: &str) -> Option<&'static str> {
        self.factories.get(provider_type).map(|f| f.default_model())
    }

    /// Registry with the Groq and OpenAI factories.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::GroqProviderFactory));
        registry.register(Arc::new(super::OpenAiProviderFactory));
        registry
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn ProviderFactory>, ProviderError> {
        self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider type: '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

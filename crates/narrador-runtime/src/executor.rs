//! Concurrent fan-out of one prompt to the configured providers.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::RuntimeConfig;
use crate::providers::{LlmProvider, ProviderError, ProviderRegistry, ProviderResult};

/// Sends a prompt to every configured provider and collects what comes back.
///
/// A provider that fails or answers with blank text is logged and left out
/// of the result; it never prevents the others from answering.
pub struct PromptExecutor {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl PromptExecutor {
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Build adapters for every provider that has a credential.
    pub fn from_config(
        config: &RuntimeConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, ProviderError> {
        let providers = registry.create_configured(config.provider_settings())?;
        if providers.is_empty() {
            tracing::warn!(
                "No provider credentials configured, every request will come back empty"
            );
        }
        Ok(Self::new(providers))
    }

    /// Run `prompt` against all configured providers.
    pub async fn execute(&self, prompt: &str) -> BTreeMap<String, ProviderResult> {
        self.fan_out(prompt, self.providers.iter().collect()).await
    }

    /// Run `prompt` against the named subset of configured providers and
    /// report every outcome, failures included.
    ///
    /// Names that are not configured come back as
    /// [`ProviderError::NotConfigured`].
    pub async fn execute_on(
        &self,
        prompt: &str,
        names: &[&str],
    ) -> BTreeMap<String, Result<ProviderResult, ProviderError>> {
        let selected = self
            .providers
            .iter()
            .filter(|p| names.contains(&p.name()))
            .collect();

        let mut outcomes: BTreeMap<_, _> =
            self.call_all(prompt, selected).await.into_iter().collect();
        for name in names {
            outcomes.entry(name.to_string()).or_insert_with(|| {
                tracing::debug!(provider = %name, "Requested provider is not configured");
                Err(ProviderError::NotConfigured(name.to_string()))
            });
        }
        outcomes
    }

    /// Configured adapter by name.
    pub fn provider(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Ask every configured provider whether it is usable.
    pub async fn health(&self) -> BTreeMap<String, bool> {
        let checks = self.providers.iter().map(|provider| async move {
            (provider.name().to_string(), provider.health_check().await)
        });
        join_all(checks).await.into_iter().collect()
    }

    async fn fan_out(
        &self,
        prompt: &str,
        providers: Vec<&Arc<dyn LlmProvider>>,
    ) -> BTreeMap<String, ProviderResult> {
        self.call_all(prompt, providers)
            .await
            .into_iter()
            .filter_map(|(name, outcome)| match outcome {
                Ok(result) if result.has_content() => Some((name, result)),
                _ => None,
            })
            .collect()
    }

    async fn call_all(
        &self,
        prompt: &str,
        providers: Vec<&Arc<dyn LlmProvider>>,
    ) -> Vec<(String, Result<ProviderResult, ProviderError>)> {
        let calls = providers.into_iter().map(|provider| async move {
            let started = Instant::now();
            let outcome = provider.generate(prompt).await;
            (provider.name().to_string(), outcome, started.elapsed())
        });

        join_all(calls)
            .await
            .into_iter()
            .map(|(name, outcome, elapsed)| {
                match &outcome {
                    Ok(result) if result.has_content() => {
                        tracing::debug!(provider = %name, elapsed = ?elapsed, "Provider answered");
                    }
                    Ok(_) => tracing::warn!(provider = %name, "Provider returned blank text"),
                    Err(e) => tracing::warn!(provider = %name, error = %e, "Provider call failed"),
                }
                (name, outcome)
            })
            .collect()
    }
}

impl std::fmt::Debug for PromptExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptExecutor")
            .field("providers", &self.provider_names())
            .finish()
    }
}

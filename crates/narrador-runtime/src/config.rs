//! Runtime configuration.
//!
//! Everything is read once from environment variables into a
//! [`RuntimeConfig`] that is passed to constructors. Nothing reads the
//! environment after startup.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `GROQ_API_KEY` | enables the Groq provider | unset |
//! | `GROQ_MODEL` | Groq model | `mixtral-8x7b-32768` |
//! | `GROQ_BASE_URL` | Groq endpoint | `https://api.groq.com/openai/v1` |
//! | `OPENAI_API_KEY` | enables the OpenAI provider | unset |
//! | `OPENAI_MODEL` | OpenAI model | `gpt-4o-mini` |
//! | `OPENAI_BASE_URL` | OpenAI endpoint | `https://api.openai.com/v1` |
//! | `API_TOKEN` | token expected in `x-api-token` | `123456` |
//! | `DATABASE_URL` | story store location | `sqlite:///./database.db` |
//! | `PROVIDER_TIMEOUT` | per-call timeout (humantime) | `60s` |

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{
    ApiCredential, CredentialSource, ProviderError, ProviderRegistry, ProviderSettings, GROQ,
    OPENAI,
};

/// Token accepted when `API_TOKEN` is not set.
pub const DEFAULT_API_TOKEN: &str = "123456";

/// Store location when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///./database.db";

/// Per-call provider timeout when `PROVIDER_TIMEOUT` is not set.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid PROVIDER_TIMEOUT '{value}': {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error(
        "Unsupported DATABASE_URL '{0}': expected sqlite:///path, sqlite::memory: or a file path"
    )]
    InvalidDatabaseUrl(String),

    #[error("Provider configuration error: {0}")]
    Provider(#[from] ProviderError),
}

/// Where the story store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl StoreLocation {
    /// Parse `sqlite:///path`, `sqlite://path`, `sqlite::memory:` or a bare path.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url == "sqlite::memory:" || url == ":memory:" {
            return Ok(Self::Memory);
        }

        let path = match url.strip_prefix("sqlite:") {
            Some(rest) => rest
                .strip_prefix("///")
                .or_else(|| rest.strip_prefix("//"))
                .unwrap_or(rest),
            None if url.contains("://") => {
                return Err(ConfigError::InvalidDatabaseUrl(url.to_string()))
            }
            None => url,
        };

        if path.is_empty() {
            return Err(ConfigError::InvalidDatabaseUrl(url.to_string()));
        }
        Ok(Self::File(PathBuf::from(path)))
    }
}

/// Configuration for the whole service.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Draft provider settings
    pub groq: ProviderSettings,

    /// Refine/summary provider settings
    pub openai: ProviderSettings,

    /// Token clients must present
    pub api_token: ApiCredential,

    /// Story store location
    pub store: StoreLocation,

    /// Per-call provider timeout
    pub provider_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            groq: ProviderSettings::default(),
            openai: ProviderSettings::default(),
            api_token: ApiCredential::new(
                DEFAULT_API_TOKEN,
                CredentialSource::Default,
                "API token",
            ),
            store: StoreLocation::File(PathBuf::from("./database.db")),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider_timeout = match non_empty("PROVIDER_TIMEOUT") {
            Some(value) => parse_timeout(&value)?,
            None => DEFAULT_PROVIDER_TIMEOUT,
        };

        let provider = |prefix: &str, name: &'static str| ProviderSettings {
            credential: ApiCredential::from_lookup(&lookup, &format!("{}_API_KEY", prefix), name),
            model: non_empty(&format!("{}_MODEL", prefix)),
            base_url: non_empty(&format!("{}_BASE_URL", prefix)),
            timeout: provider_timeout,
        };

        let api_token = ApiCredential::from_lookup(&lookup, "API_TOKEN", "API token")
            .unwrap_or_else(|| {
                ApiCredential::new(DEFAULT_API_TOKEN, CredentialSource::Default, "API token")
            });

        let database_url =
            non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        Ok(Self {
            groq: provider("GROQ", "Groq API key"),
            openai: provider("OPENAI", "OpenAI API key"),
            api_token,
            store: StoreLocation::parse(&database_url)?,
            provider_timeout,
        })
    }

    /// Provider settings keyed by registered provider name.
    pub fn provider_settings(&self) -> [(&'static str, &ProviderSettings); 2] {
        [(GROQ, &self.groq), (OPENAI, &self.openai)]
    }

    /// Check every configured provider against the registry.
    pub fn validate(&self, registry: &ProviderRegistry) -> Result<(), ConfigError> {
        for (name, settings) in self.provider_settings() {
            if settings.is_configured() {
                registry.validate(name, settings)?;
            }
        }
        Ok(())
    }

    /// True when the built-in demo token is in use.
    pub fn uses_default_token(&self) -> bool {
        self.api_token.source() == CredentialSource::Default
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidTimeout {
        value: value.to_string(),
        reason,
    };

    let timeout = humantime::parse_duration(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if timeout.is_zero() {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(timeout)
}

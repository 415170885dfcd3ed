//! # narrador-runtime
//!
//! Everything in narrador that talks to the outside world.
//!
//! - [`providers`]: adapters for the OpenAI-compatible chat APIs (Groq, OpenAI)
//! - [`PromptExecutor`]: concurrent fan-out of one prompt to every provider
//! - [`EvolutionaryChain`]: draft with one provider, refine with another
//! - [`StoryGenerator`]: one story per provider on the same topic
//! - [`Summarizer`]: single-call summaries
//! - [`store`]: the append-only SQLite story store
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use narrador_runtime::{
//!     EvolutionaryChain, PromptExecutor, ProviderRegistry, RuntimeConfig, SqliteStoryStore,
//! };
//!
//! let config = RuntimeConfig::from_env()?;
//! let registry = ProviderRegistry::with_defaults();
//! let executor = Arc::new(PromptExecutor::from_config(&config, &registry)?);
//! let store = Arc::new(SqliteStoryStore::open_location(&config.store)?);
//!
//! let chain = EvolutionaryChain::new(executor, store);
//! let result = chain.run(&EvolutionaryStoryRequest::new("um dragão")).await?;
//! println!("{}", result.final_text);
//! ```

pub mod chain;
pub mod config;
pub mod executor;
pub mod providers;
pub mod store;
pub mod story;
pub mod summarizer;

#[cfg(test)]
mod testing;

pub use chain::{ChainError, EvolutionaryChain, EvolutionaryChainBuilder};
pub use config::{ConfigError, RuntimeConfig, StoreLocation};
pub use executor::PromptExecutor;
pub use providers::{
    ApiCredential, CredentialSource, LlmProvider, ProviderError, ProviderRegistry,
    ProviderResult, ProviderSettings,
};
pub use store::{PersistenceError, SqliteStoryStore, StorySink};
pub use story::{StoryError, StoryGenerator};
pub use summarizer::{SummaryError, Summarizer};

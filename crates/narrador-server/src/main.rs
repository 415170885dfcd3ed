use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use narrador_runtime::{PromptExecutor, ProviderRegistry, RuntimeConfig, SqliteStoryStore};
use narrador_server::AppState;

#[derive(Parser)]
#[command(
    name = "narrador",
    version,
    about = "Story generation and summarization API backed by Groq and OpenAI"
)]
struct Cli {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = RuntimeConfig::from_env().context("Failed to load configuration")?;
    let registry = ProviderRegistry::with_defaults();
    config
        .validate(&registry)
        .context("Invalid provider configuration")?;

    if config.uses_default_token() {
        warn!("API_TOKEN not set, accepting the built-in default token");
    }

    let executor = Arc::new(
        PromptExecutor::from_config(&config, &registry).context("Failed to build providers")?,
    );
    let store = Arc::new(
        SqliteStoryStore::open_location(&config.store).context("Failed to open story store")?,
    );

    info!(
        providers = ?executor.provider_names(),
        store = ?config.store,
        timeout = ?config.provider_timeout,
        "narrador configured"
    );

    let state = AppState::new(executor, store, config.api_token.clone());
    narrador_server::serve(state, &cli.host, cli.port)
        .await
        .context("Server error")?;

    Ok(())
}

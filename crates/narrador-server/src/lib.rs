//! # narrador-server
//!
//! HTTP API over the narrador runtime.
//!
//! | route | purpose |
//! |---|---|
//! | `POST /v1/llm/gerar_historia?tema=` | one story per provider |
//! | `POST /v1/llm/resumir_texto?texto=` | plain summary |
//! | `POST /v2/llm/gerar_historia_evolutiva?tema=&estilo=&genero=&extensao=` | draft then refine |
//! | `POST /v2/llm/resumir_texto_avancado?texto=&tamanho=` | summary with keywords and sentiment |
//! | `GET /health` | liveness and per-provider health |
//!
//! Every `POST` route requires the shared token (see [`auth`]).

use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use narrador_runtime::{
    ApiCredential, EvolutionaryChain, PromptExecutor, StoryGenerator, StorySink, Summarizer,
};

pub mod auth;
pub mod error;
pub mod routes;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<PromptExecutor>,
    pub stories: Arc<StoryGenerator>,
    pub chain: Arc<EvolutionaryChain>,
    pub summarizer: Arc<Summarizer>,
    pub api_token: Arc<ApiCredential>,
}

impl AppState {
    /// Wire the flows to one executor and one story sink.
    pub fn new(
        executor: Arc<PromptExecutor>,
        sink: Arc<dyn StorySink>,
        api_token: ApiCredential,
    ) -> Self {
        Self {
            stories: Arc::new(StoryGenerator::new(executor.clone(), sink.clone())),
            chain: Arc::new(EvolutionaryChain::new(executor.clone(), sink)),
            summarizer: Arc::new(Summarizer::from_executor(&executor)),
            executor,
            api_token: Arc::new(api_token),
        }
    }
}

/// Build the router with every route and the request trace layer.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/v1/llm/gerar_historia", post(routes::generate_story))
        .route("/v1/llm/resumir_texto", post(routes::summarize))
        .route(
            "/v2/llm/gerar_historia_evolutiva",
            post(routes::generate_evolutionary_story),
        )
        .route(
            "/v2/llm/resumir_texto_avancado",
            post(routes::summarize_advanced),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("narrador listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

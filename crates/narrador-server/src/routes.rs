//! Request handlers.
//!
//! Parameters come from the query string, as in the `/v1` API the service
//! started with.

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;

use narrador_core::{
    BasicStory, ChainResult, EvolutionaryStoryRequest, StoryRequest, SummaryRequest,
    SummaryResult,
};

use crate::error::{ApiError, ADVANCED_SUMMARY_FAILED, SUMMARY_FAILED};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub providers: BTreeMap<String, bool>,
}

/// `GET /health`: "degraded" when any configured provider fails its check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let providers = state.executor.health().await;
    let status = if providers.values().all(|healthy| *healthy) {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status, providers })
}

/// `POST /v1/llm/gerar_historia`
pub async fn generate_story(
    State(state): State<AppState>,
    Query(request): Query<StoryRequest>,
) -> Result<Json<BasicStory>, ApiError> {
    Ok(Json(state.stories.generate(&request).await?))
}

/// `POST /v1/llm/resumir_texto`
pub async fn summarize(
    State(state): State<AppState>,
    Query(request): Query<SummaryRequest>,
) -> Result<Json<SummaryResult>, ApiError> {
    state
        .summarizer
        .basic(&request)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_summary(e, SUMMARY_FAILED))
}

/// `POST /v2/llm/gerar_historia_evolutiva`
pub async fn generate_evolutionary_story(
    State(state): State<AppState>,
    Query(request): Query<EvolutionaryStoryRequest>,
) -> Result<Json<ChainResult>, ApiError> {
    Ok(Json(state.chain.run(&request).await?))
}

/// `POST /v2/llm/resumir_texto_avancado`
pub async fn summarize_advanced(
    State(state): State<AppState>,
    Query(request): Query<SummaryRequest>,
) -> Result<Json<SummaryResult>, ApiError> {
    state
        .summarizer
        .advanced(&request)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_summary(e, ADVANCED_SUMMARY_FAILED))
}

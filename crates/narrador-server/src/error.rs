//! Client-facing errors.
//!
//! Every error body is `{"detail": "<message>"}`. Internal failures are
//! logged in full and reach the client only as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use narrador_runtime::providers::{GROQ, OPENAI};
use narrador_runtime::{ChainError, StoryError, SummaryError};

pub const INVALID_TOKEN: &str = "Token inválido";
pub const NO_CONTENT: &str = "Nenhum serviço retornou resposta válida.";
pub const EMPTY_SUMMARY: &str = "O serviço não retornou um resumo válido.";

pub const STORY_FAILED: &str = "Erro interno ao gerar história";
pub const EVOLUTIONARY_STORY_FAILED: &str = "Erro interno ao gerar história evolutiva";
pub const SUMMARY_FAILED: &str = "Erro interno ao resumir texto";
pub const ADVANCED_SUMMARY_FAILED: &str = "Erro interno ao resumir texto avançado";

/// 400 message for a draft stage that produced nothing, e.g.
/// "Falha ao gerar esboço com Groq.".
pub fn draft_failed(provider: &str) -> String {
    let label = match provider {
        GROQ => "Groq",
        OPENAI => "OpenAI",
        other => other,
    };
    format!("Falha ao gerar esboço com {}.", label)
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Token inválido")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Log `error` and hide it behind `message`.
    pub fn internal(message: &str, error: &dyn std::error::Error) -> Self {
        tracing::error!(error = %error, "{}", message);
        Self::Internal(message.to_string())
    }

    /// Summary failures; the generic message depends on the endpoint.
    pub fn from_summary(error: SummaryError, message: &str) -> Self {
        match error {
            SummaryError::EmptySummary => Self::BadRequest(EMPTY_SUMMARY.to_string()),
            other => Self::internal(message, &other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoryError> for ApiError {
    fn from(error: StoryError) -> Self {
        match error {
            StoryError::NoContent => Self::BadRequest(NO_CONTENT.to_string()),
            other => Self::internal(STORY_FAILED, &other),
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(error: ChainError) -> Self {
        match error {
            ChainError::DraftGenerationFailed { provider, cause } => {
                match &cause {
                    Some(e) => tracing::warn!(provider = %provider, error = %e, "Draft failed"),
                    None => tracing::warn!(provider = %provider, "Draft was blank"),
                }
                Self::BadRequest(draft_failed(&provider))
            }
            other => Self::internal(EVOLUTIONARY_STORY_FAILED, &other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

//! Shared-token check for the `/v1` and `/v2` routes.

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// Header carrying the token.
pub const TOKEN_HEADER: &str = "x-api-token";

/// Query string fallback used when the header is absent.
#[derive(Deserialize)]
struct TokenQuery {
    x_api_token: Option<String>,
}

/// Rejects the request with 401 before any handler runs.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match presented_token(&request) {
        Some(token) if state.api_token.matches(&token) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected request with invalid token");
            Err(ApiError::Unauthorized)
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "Rejected request without token");
            Err(ApiError::Unauthorized)
        }
    }
}

fn presented_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(query)| query.x_api_token)
    })
}

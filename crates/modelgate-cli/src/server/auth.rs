use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use super::handlers::AppState;

const LOGGED_KEY_PREFIX: usize = 8;

/// Reject requests whose API-key header is missing or not allow-listed.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let security = &state.gateway.config().security;
    let presented = request
        .headers()
        .get(security.api_key_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match presented {
        Some(key) if security.api_keys.contains(&key) => next.run(request).await,
        Some(key) => {
            let prefix: String = key.chars().take(LOGGED_KEY_PREFIX).collect();
            tracing::warn!(key_prefix = %prefix, path = %request.uri().path(), "rejected API key");
            ApiError::Forbidden("Invalid API key").into_response()
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "missing API key header");
            ApiError::Forbidden("Missing API key").into_response()
        }
    }
}

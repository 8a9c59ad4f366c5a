//! Route definitions

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use super::auth::require_api_key;
use super::handlers::{
    AppState, classify, evict_model, get_limits, health, list_models, root, settings, summarize,
    translate, update_limit, usage,
};

/// Public routes plus the API-key protected ones.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/operations/summarize", post(summarize))
        .route("/operations/translate", post(translate))
        .route("/operations/classify", post(classify))
        .route("/limits", get(get_limits).put(update_limit))
        .route("/limits/usage", get(usage))
        .route("/models", get(list_models))
        .route("/models/{model}", delete(evict_model))
        .route("/settings", get(settings))
        .route_layer(middleware::from_fn_with_state(state, require_api_key));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(protected)
}

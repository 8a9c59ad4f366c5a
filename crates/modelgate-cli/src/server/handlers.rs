//! HTTP request handlers

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use modelgate_runtime::{Gateway, Orchestrator};
use modelgate_types::{
    ClassifyRequest, ClassifyResponse, HealthResponse, LimitsResponse, ModelStatus,
    SettingsResponse, SummarizeRequest, SummarizeResponse, TranslateRequest, TranslateResponse,
    UpdateLimitRequest, UsageResponse,
};
use serde::Serialize;
use serde_json::json;

use super::error::ApiError;

/// Shared application state
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run an operation on its own task. A client that disconnects drops the
/// handler future, but the spawned pipeline still finishes its accounting.
async fn detached<T, F, Fut>(state: &AppState, run: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(Orchestrator) -> Fut,
    Fut: Future<Output = modelgate_runtime::Result<T>> + Send + 'static,
{
    let orchestrator = state.gateway.orchestrator().clone();
    let response = tokio::spawn(run(orchestrator)).await??;
    Ok(Json(response))
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "modelgate",
        "version": env!("CARGO_PKG_VERSION"),
        "operations": ["summarize", "translate", "classify"],
        "health": "/health",
    }))
}

/// Liveness plus model residency; `degraded` still answers 200.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(state.gateway.health())
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<SummarizeResponse> {
    let Json(request) = payload?;
    detached(&state, |orchestrator| async move {
        orchestrator.summarize(request).await
    })
    .await
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<TranslateResponse> {
    let Json(request) = payload?;
    detached(&state, |orchestrator| async move {
        orchestrator.translate(request).await
    })
    .await
}

pub async fn classify(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> ApiResult<ClassifyResponse> {
    let Json(request) = payload?;
    detached(&state, |orchestrator| async move {
        orchestrator.classify(request).await
    })
    .await
}

pub async fn get_limits(State(state): State<Arc<AppState>>) -> ApiResult<LimitsResponse> {
    Ok(Json(state.gateway.quota().snapshot_limits().await?))
}

pub async fn update_limit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateLimitRequest>, JsonRejection>,
) -> ApiResult<LimitsResponse> {
    let Json(request) = payload?;
    let quota = state.gateway.quota();
    quota.set_limit(request.operation, request.daily_limit).await?;
    Ok(Json(quota.snapshot_limits().await?))
}

pub async fn usage(State(state): State<Arc<AppState>>) -> ApiResult<UsageResponse> {
    Ok(Json(state.gateway.quota().snapshot_usage().await?))
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelStatus>,
}

pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.gateway.model_statuses(),
    })
}

/// `evicted` is false when the model was not resident.
pub async fn evict_model(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
) -> ApiResult<serde_json::Value> {
    let evicted = state.gateway.evict(&model)?;
    Ok(Json(json!({ "model": model, "evicted": evicted })))
}

pub async fn settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    Json(state.gateway.settings())
}

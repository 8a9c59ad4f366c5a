//! HTTP surface of the gateway.
//!
//! Operations, limits, usage, model management and settings sit behind the
//! API-key gate; `/` and `/health` are open.

mod auth;
mod error;
mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use modelgate_runtime::Gateway;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use handlers::AppState;
pub use routes::api_routes;

/// Full application router with state attached.
pub fn app(gateway: Arc<Gateway>) -> Router {
    let state = Arc::new(AppState::new(gateway));

    Router::new()
        .merge(api_routes(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn start(gateway: Arc<Gateway>) -> Result<()> {
    let addr = gateway.config().server.addr();
    let app = app(gateway);

    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /operations/summarize|translate|classify");
    tracing::info!("  GET  /limits, PUT /limits, GET /limits/usage");
    tracing::info!("  GET  /models, DELETE /models/{{model}}");
    tracing::info!("  GET  /settings, GET /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining in-flight requests");
}

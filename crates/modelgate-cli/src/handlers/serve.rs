use crate::context::ExecutionContext;
use crate::server;
use anyhow::Result;
use modelgate_runtime::Gateway;
use std::sync::Arc;

pub async fn handle(
    ctx: &ExecutionContext,
    host: Option<String>,
    port: Option<u16>,
    preload: bool,
) -> Result<()> {
    let mut config = ctx.config()?.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let gateway = Arc::new(Gateway::open(config).await?);

    if preload {
        let resident = gateway.preload().await;
        if resident < gateway.config().operations.len() {
            tracing::warn!(resident, "some models failed to preload; they will load on first use");
        }
    }

    server::start(gateway).await
}

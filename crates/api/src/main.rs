use std::sync::Arc;

use anyhow::Context;

use zap_api::app::{build_app, AppServices};
use zap_api::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    zap_observability::init_with(config.mode.log_format());

    if config.mode.is_development() {
        tracing::warn!("running in development mode; error responses include internal details");
    }
    if config.vapid.public_key.is_none() {
        tracing::warn!("VAPID keys not set; push subscriptions will fail");
    }

    let bind_addr = config.bind_addr;
    let services = Arc::new(AppServices::in_memory(config));
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

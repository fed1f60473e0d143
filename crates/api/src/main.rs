use std::sync::Arc;

use anyhow::Context;

use docgate_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docgate_observability::init();

    let config = AppConfig::from_env()?;
    tracing::info!(config = ?config, "configuration loaded");

    let services = docgate_api::app::services::build_services(&config).await?;
    let app = docgate_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

use anyhow::Context;

use findoc_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    findoc_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app = findoc_api::app::build_app(&config)
        .await
        .context("failed to start services")?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(app = %config.app_name, "listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

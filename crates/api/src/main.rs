mod envelope;
mod middleware;
mod routes;
mod state;
mod validation;

use std::net::SocketAddr;

use formsrv_infra::{config::AppConfig, logging::init_tracing};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config)?;

    match config.deploy_mode.to_ascii_lowercase().as_str() {
        "api" => serve(config).await,
        "lambda" => anyhow::bail!(
            "deploy mode 'lambda' needs the external gateway adapter; run with DEPLOY_MODE=api"
        ),
        other => anyhow::bail!("invalid deploy mode: {other}"),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = state::AppState::new(config.clone()).await?;
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, backend = %config.data_backend, "starting api");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "server exited");
            err
        })?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

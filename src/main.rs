use std::net::SocketAddr;

use anyhow::Context;
use lodging_checkout::config::AppConfig;
use lodging_checkout::{app, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env()?;
    let state = AppState::build(config)?;

    if state.config.stripe_secret_key.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY is not set; checkout sessions will fail");
    }
    if state.config.redirect_urls().is_none() {
        tracing::warn!("SUCCESS_URL or CANCEL_URL is not set; checkout sessions will fail");
    }

    let socket_addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port)
        .parse()
        .context("invalid HOST/PORT")?;
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    tracing::info!(
        addr = %socket_addr,
        currency = %state.config.currency,
        seasons = state.config.rate_schedule.seasons.len(),
        "Lodging checkout listening"
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, finishing in-flight requests");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

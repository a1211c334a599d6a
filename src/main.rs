use std::sync::Arc;

use order_intake::api;
use order_intake::config::Config;
use order_intake::error::AppError;
use order_intake::state::{AppState, Services};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let services = Services::from_config(&config)?;
    tracing::info!(
        extraction_provider = services.extractor.is_some(),
        speech_provider = services.speech.is_some(),
        geocoder = services.geocoder.is_some(),
        route_tiers = services.routes.len(),
        "providers configured"
    );

    let app_state = AppState::new(
        services,
        config.event_buffer_size,
        config.recent_orders_limit,
    );
    let app = api::rest::router(Arc::new(app_state));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

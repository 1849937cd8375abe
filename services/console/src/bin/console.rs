//! services/console/src/bin/console.rs

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use console_lib::{
    adapters::RestApiAdapter,
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting console...");

    // --- 2. Initialize the Upstream Adapter ---
    let api = Arc::new(RestApiAdapter::new(
        config.upstream_api_url.clone(),
        config.upstream_api_token.clone(),
        config.upstream_timeout,
    )?);
    info!("Upstream API at {}", config.upstream_api_url);

    // --- 3. Build the Shared AppState ---
    let shutdown = CancellationToken::new();
    let mut app_state = AppState::new(api, config.clone());
    app_state.aggregator = app_state.aggregator.with_cancellation(shutdown.clone());
    let app_state = Arc::new(app_state);

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let app = build_router(app_state).layer(cors);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown requested; cancelling in-flight aggregations."),
                Err(e) => {
                    error!("Failed to listen for the shutdown signal: {}", e);
                    std::future::pending::<()>().await;
                }
            }
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use catalog_cell::{CatalogRepository, InMemoryCatalogRepository};
use shared_athena::AthenaClient;
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Missing required Athena API credentials")?;

    info!("Starting clinic scheduler API ({})", config.app_env);
    info!(
        "Athena practice {} ({})",
        config.athena_practice_id, config.athena_environment
    );

    let athena = Arc::new(AthenaClient::new(&config));
    let catalog: Arc<dyn CatalogRepository> =
        Arc::new(InMemoryCatalogRepository::with_default_catalog());

    // Warm the token so credential problems show up at startup
    let warmup = athena.clone();
    tokio::spawn(async move {
        match warmup.verify_credentials().await {
            Ok(()) => info!("Athena access token obtained successfully"),
            Err(e) => error!("Initial Athena authentication failed: {}", e),
        }
    });

    let app = router::create_router(&config, athena, catalog)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&config)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn cors_layer(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    Ok(match &config.frontend_url {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid FRONTEND_URL: {}", origin))?;
            cors.allow_origin(origin)
        }
        None => cors.allow_origin(Any),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

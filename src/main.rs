use std::sync::Arc;
use std::time::Duration;
use symptoscan::{
    api::{build_router_with_timeout, AppState},
    catalog,
    config::Config,
    state::create_store,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::embedded_defaults()?, Some(e)),
    };

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("symptoscan={},tower_http=info", config.observability.log_level).into()
    });
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Some(e) = config_error {
        tracing::warn!("Failed to load configuration: {}", e);
        tracing::warn!("Using embedded default configuration");
    }

    tracing::info!("Starting SymptoScan v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = symptoscan::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    // Initialize storage backend
    tracing::info!("Storage backend: {:?}", config.state.backend);
    let store = create_store(&config.state).await?;
    tracing::info!("✅ Storage backend initialized");

    let state = AppState::from_config(&config, Arc::clone(&store))?;
    if state.chat.uses_llm() {
        tracing::info!(model = %config.chat.model, "✅ Chat broker using LLM endpoint");
    } else if config.chat.enabled {
        tracing::info!(
            "⚠️  No API key in {}, chat broker using mock responses",
            config.chat.api_key_env
        );
    }

    // Train or load classifiers before the catalog records their artifacts
    if config.models.warm_up {
        let failed = state.predictions.warm_up().await;
        if !failed.is_empty() {
            tracing::warn!(?failed, "Some classifiers are unavailable until retrained");
        }
    }

    let diseases = catalog::seed_diseases(store.as_ref(), state.classifiers()).await?;
    tracing::info!(count = diseases.len(), "✅ Disease catalog ready");

    let app = build_router_with_timeout(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   REST API: http://{}/v1/diseases", http_addr);
    if config.chat.enabled {
        tracing::info!("   Chat: http://{}/v1/chat/messages", http_addr);
    }
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(http_listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

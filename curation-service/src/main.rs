use curation_service::config::CurationConfig;
use curation_service::services::metrics::init_metrics;
use curation_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Logging is configured from the loaded config, so a load failure can
    // only go to stderr.
    let config = CurationConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "curation-service",
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    // Must be installed before any metric is recorded.
    if let Err(e) = init_metrics() {
        tracing::error!("Failed to install metrics recorder: {}", e);
    }

    tracing::info!(
        store = ?config.store,
        storage = ?config.storage.backend,
        port = config.common.port,
        "Starting curation-service"
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await?;

    tracing::info!("curation-service stopped");
    Ok(())
}

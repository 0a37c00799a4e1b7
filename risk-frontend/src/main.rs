use dotenvy::dotenv;
use risk_frontend::config::get_configuration;
use risk_frontend::startup::Application;
use service_core::observability::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "risk-frontend",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    );

    risk_frontend::services::metrics::init_metrics();

    let application = Application::build(configuration.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start risk-frontend: {}", e))?;

    info!(
        "Starting risk-frontend on {}:{}",
        configuration.server.host,
        application.port()
    );
    application.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}

use std::path::Path;
use std::sync::Arc;

use lead_agent::assess::AnthropicAssessor;
use lead_agent::config::AgentConfig;
use lead_agent::notify::WhatsAppDispatcher;
use lead_agent::pipeline::{LeadProcessor, Supervisor};
use lead_agent::store::LibSqlStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local .env is optional; real deployments set the environment directly
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  required: ANTHROPIC_API_KEY, DATABASE_URL");
        std::process::exit(1);
    });

    eprintln!("🤖 Lead Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Gateway: {}", config.gateway_url);
    eprintln!("   Interval: {}s", config.check_interval.as_secs());

    let store = Arc::new(
        LibSqlStore::new_local(Path::new(&config.database_url))
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open lead store at {}: {e}", config.database_url);
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", config.database_url);

    let assessor = Arc::new(AnthropicAssessor::new(
        config.anthropic_api_key.clone(),
        config.model.clone(),
        config.http_timeout,
    ));
    let dispatcher = Arc::new(WhatsAppDispatcher::new(
        config.gateway_url.clone(),
        config.gateway_token.clone(),
        config.http_timeout,
    ));

    let processor = Arc::new(LeadProcessor::new(
        store,
        assessor,
        dispatcher,
        config.inter_lead_delay,
    ));
    let supervisor = Supervisor::new(processor, config.check_interval, config.error_backoff);

    // SIGINT and SIGTERM both request the same cooperative stop; the loop
    // observes it at its next suspension-point check.
    let run_state = supervisor.run_state();
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
        run_state.request_stop();
    });

    supervisor.run().await;
    Ok(())
}

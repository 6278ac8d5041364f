use anyhow::Context;
use mailgate::constants::DEFAULT_HOSTNAME;
use mailgate::email::MailParserEmailParser;
use mailgate::models::GatewayConfig;
use mailgate::services::LapinBroker;
use mailgate::{IngestPipeline, SmtpServer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = GatewayConfig::from_env().context("loading configuration")?;
    info!(routes = config.routes.len(), "Starting mailgate");

    // The broker is a startup dependency: no listener without a usable
    // channel.
    let broker = LapinBroker::connect(&config.broker_url)
        .await
        .context("connecting to broker")?;

    let pipeline = Arc::new(IngestPipeline::new(
        config.routes.clone(),
        Arc::new(MailParserEmailParser::new()),
        Arc::new(broker),
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    let server = SmtpServer::new(DEFAULT_HOSTNAME, pipeline.clone());

    let run_result = tokio::select! {
        result = server.run(listener) => {
            result.context("server loop failed")
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    // Channel and connection close before the listener is released (the
    // select drop stops accepting). This runs even when the accept loop
    // failed so the broker connection never leaks.
    pipeline.shutdown().await.context("closing broker")?;
    run_result?;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => return std::future::pending().await,
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

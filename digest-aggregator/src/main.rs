use anyhow::Context;
use clap::Parser;
use digest_aggregator::server::{self, AppState};
use digest_aggregator::{FeedAggregator, Settings};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::parse();
    info!("Starting digest aggregator");

    let aggregator = Arc::new(
        FeedAggregator::with_default_sources(settings.fetch_config(), &settings.endpoints())
            .context("failed to build HTTP client")?,
    );
    info!("Registered sources: {:?}", aggregator.source_tags());

    info!("Performing initial refresh");
    let snapshot = aggregator.refresh().await;
    if !snapshot.errors.is_empty() {
        error!("Initial refresh had {} failed sources", snapshot.errors.len());
    }

    let schedule = tokio::spawn(refresh_periodically(
        Arc::clone(&aggregator),
        settings.refresh_interval(),
    ));

    let state = AppState::new(aggregator);
    let served = server::serve(settings.socket_addr(), state, shutdown_signal()).await;

    schedule.abort();
    served.context("HTTP server failed")?;
    info!("Shut down cleanly");
    Ok(())
}

async fn refresh_periodically(aggregator: Arc<FeedAggregator>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick fires immediately; startup already refreshed
    ticker.tick().await;

    loop {
        ticker.tick().await;
        info!("Scheduled refresh");
        aggregator.refresh().await;
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

//! Tarifa rate import worker
//!
//! Consumes rate import jobs from Redis, imports the uploaded CSV of each
//! destination rate group into PostgreSQL and asks CGRateS to reload the
//! brand's tariff plan.

use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tarifa_cgrates::{CgratesClient, CgratesReloadService};
use tarifa_core::config::LoggingConfig;
use tarifa_core::AppConfig;
use tarifa_db::{create_pool, PgBatchWriter, PgRateGroupRepository};
use tarifa_importer::{JobIntake, LocalFileStore, RateImportService};
use tarifa_queue::{RedisEventPublisher, RedisJobQueue};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing(config: &LoggingConfig) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| config.level.clone());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tarifa_worker={},tarifa_importer={},tarifa_db={},tarifa_queue={},tarifa_cgrates={},sqlx=warn",
            log_level, log_level, log_level, log_level, log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    info!("Starting Tarifa worker v{}", env!("CARGO_PKG_VERSION"));

    info!("Connecting to database...");
    let pool = create_pool(&config.database).await?;

    let queue = RedisJobQueue::new(&config.redis.url, config.redis.queue_key.clone()).await?;
    let publisher =
        RedisEventPublisher::new(&config.redis.url, config.redis.events_channel.clone()).await?;
    match queue.len().await {
        Ok(waiting) => info!("Redis connected, consuming {} ({} jobs waiting)", queue.key(), waiting),
        Err(e) => warn!("Redis connected, consuming {} (queue length unknown: {})", queue.key(), e),
    }

    let cgrates = CgratesClient::new(&config.cgrates.url, config.cgrates.timeout_ms)
        .context("Failed to create CGRateS client")?;
    match cgrates.health_check().await {
        Ok(true) => info!("CGRateS reachable at {}", config.cgrates.url),
        Ok(false) => warn!("CGRateS at {} answered ping unexpectedly", config.cgrates.url),
        Err(e) => warn!("CGRateS unreachable at {}: {}", config.cgrates.url, e),
    }

    let service = RateImportService::new(
        Arc::new(PgRateGroupRepository::new(pool.clone())),
        Arc::new(LocalFileStore::new(&config.importer.storage_path)),
        Arc::new(PgBatchWriter::new(pool.clone())),
        Arc::new(publisher),
        Arc::new(CgratesReloadService::new(Arc::new(cgrates))),
    )
    .with_chunk_size(config.importer.effective_chunk_size());

    let intake = JobIntake::new(Arc::new(service));
    let pop_timeout = Duration::from_secs(config.redis.pop_timeout_secs);

    // Checked between pops so a job already taken off the queue is finished
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received, stopping after the current job");
                    shutdown.store(true, Ordering::SeqCst);
                }
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
        });
    }

    intake.run(&queue, pop_timeout, &shutdown).await;

    pool.close().await;
    info!("Tarifa worker stopped");

    Ok(())
}

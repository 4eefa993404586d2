use std::sync::Arc;

use anyhow::Context;
use rivalscope_core::generation::GenerationRequest;
use rivalscope_events::{EventBus, EventLogger};
use rivalscope_pipeline::archive::FsReportArchive;
use rivalscope_pipeline::completion::HttpCompletionProvider;
use rivalscope_pipeline::config::{archive_dir_from_env, CompletionConfig};
use rivalscope_pipeline::postgres::{PgProjectSource, PgReportStore};
use rivalscope_pipeline::{GeneratorConfig, ReportGenerator, ValidationService};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod sweep;

use config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rivalscope_worker=debug,rivalscope_pipeline=debug".into()),
        )
        .with(config.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let pool = rivalscope_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    rivalscope_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    rivalscope_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let events = Arc::new(EventBus::default());
    let logger = tokio::spawn(EventLogger::run(events.subscribe()));

    let reports = Arc::new(PgReportStore::new(pool.clone()));
    let archive_dir = archive_dir_from_env();
    let generator_config = GeneratorConfig::from_env();
    tracing::info!(
        archive_dir = %archive_dir.display(),
        ai_timeout_secs = generator_config.ai_timeout.as_secs(),
        generation_timeout_secs = generator_config.generation_timeout.as_secs(),
        "Report generator configured"
    );

    let generator = ReportGenerator::new(
        Arc::new(PgProjectSource::new(pool.clone())),
        reports.clone(),
        Arc::new(FsReportArchive::new(archive_dir)),
        Arc::new(HttpCompletionProvider::new(CompletionConfig::from_env())),
        events.clone(),
        generator_config,
    );
    let validator = ValidationService::new(reports, events.clone());

    if let Some(project_id) = config.generate_project_id {
        let request = GenerationRequest::for_project(project_id)
            .with_fallback(config.generate_with_fallback);
        let response = generator.generate_initial_report(request).await;
        tracing::info!(
            project_id,
            success = response.success,
            task_id = %response.task_id,
            processing_time_ms = response.processing_time_ms,
            "Startup generation finished"
        );
        println!(
            "{}",
            serde_json::to_string_pretty(&response).context("Failed to serialize response")?
        );
    }

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(sweep::run(
        validator,
        config.sweep_interval,
        cancel.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    cancel.cancel();
    let sweeps = sweeper.await.context("Integrity sweep task panicked")?;

    drop(generator);
    drop(events);
    let logged = logger.await.context("Event logger task panicked")?;

    tracing::info!(sweeps, events_logged = logged, "Worker stopped");
    Ok(())
}

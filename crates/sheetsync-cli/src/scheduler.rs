//! `setup`: one-time initialization followed by recurring passes.
//!
//! Each tick runs a full pass; overlapping ticks are turned away by the
//! pass lease rather than queued.

use std::sync::Arc;
use std::time::Duration;

use sheetsync_catalog::ShopifyAdminClient;
use sheetsync_core::AppConfig;
use sheetsync_db::PgStateStore;
use sheetsync_engine::{initialize_tracking, PassError, PassOptions};
use sheetsync_sheets::SheetSource;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub(crate) async fn run_setup(pool: PgPool, config: AppConfig) -> anyhow::Result<()> {
    let applied = sheetsync_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let sheet = crate::sources::build_sheet(&config)?;
    let catalog = Arc::new(crate::sources::build_catalog(&config)?);
    let store = PgStateStore::new(pool.clone());
    let options = PassOptions::from_config(&config);

    let state = initialize_tracking(&store, sheet.as_ref(), options.lease_ttl).await?;
    println!(
        "tracking from row {}; syncing every {} minute(s), Ctrl-C to stop",
        state.last_processed_row, config.poll_interval_minutes
    );

    let mut scheduler = build_scheduler(pool, Arc::new(config), sheet, catalog).await?;
    shutdown_signal().await;
    scheduler.shutdown().await?;
    Ok(())
}

/// Builds and starts the scheduler with the recurring sync job.
///
/// The returned handle must be kept alive; dropping it stops the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    sheet: Arc<dyn SheetSource>,
    catalog: Arc<ShopifyAdminClient>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_sync_job(&scheduler, pool, config, sheet, catalog).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_sync_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
    sheet: Arc<dyn SheetSource>,
    catalog: Arc<ShopifyAdminClient>,
) -> Result<(), JobSchedulerError> {
    let interval = poll_interval(config.poll_interval_minutes);

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let pool = pool.clone();
        let config = Arc::clone(&config);
        let sheet = Arc::clone(&sheet);
        let catalog = Arc::clone(&catalog);

        Box::pin(async move {
            tracing::debug!("scheduler: starting sync pass");
            match crate::sync::run_sync(&pool, &config, sheet.as_ref(), catalog.as_ref(), "scheduler")
                .await
            {
                Ok(report) => tracing::info!(
                    summary = %crate::sync::summarize(&report),
                    "scheduler: sync pass complete"
                ),
                Err(e) if matches!(e.downcast_ref::<PassError>(), Some(PassError::LeaseHeld)) => {
                    tracing::info!("scheduler: previous pass still running; skipping tick");
                }
                Err(e) => tracing::error!(error = %e, "scheduler: sync pass failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

fn poll_interval(minutes: u32) -> Duration {
    Duration::from_secs(u64::from(minutes.max(1)) * 60)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}

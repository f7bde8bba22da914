//! `sync`, `sync --dry-run` and `reset` handlers.
//!
//! Real passes are recorded in `sync_runs`. Row-level failures live in the
//! sheet's outcome column; only invocation-fatal errors fail the run.

use sheetsync_catalog::CatalogApi;
use sheetsync_core::{load_sync_state, AppConfig, SyncState};
use sheetsync_db::{PgStateStore, SyncRunCounts};
use sheetsync_engine::{
    first_pending_row, preview_pass, reset_tracking, sync_with_lease, PassLease, PassOptions,
    PassReport,
};
use sheetsync_sheets::SheetSource;

/// Runs one pass and records it as a sync run tagged with `trigger_source`.
///
/// The lease is taken before the run is recorded, so a tick turned away by a
/// pass already in flight leaves no trace in `sync_runs`.
///
/// # Errors
///
/// Returns an error if the run cannot be recorded or the pass fails as a
/// whole (lease held, sheet unreadable, state store failure).
pub(crate) async fn run_sync(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    sheet: &dyn SheetSource,
    catalog: &dyn CatalogApi,
    trigger_source: &str,
) -> anyhow::Result<PassReport> {
    let store = PgStateStore::new(pool.clone());
    let options = PassOptions::from_config(config);

    let lease = PassLease::acquire(&store, options.lease_ttl).await?;
    let result = record_pass(pool, &lease, sheet, catalog, &options, trigger_source).await;
    lease.release().await;
    result
}

async fn record_pass(
    pool: &sqlx::PgPool,
    lease: &PassLease<'_>,
    sheet: &dyn SheetSource,
    catalog: &dyn CatalogApi,
    options: &PassOptions,
    trigger_source: &str,
) -> anyhow::Result<PassReport> {
    let run = sheetsync_db::create_sync_run(pool, trigger_source).await?;
    if let Err(e) = sheetsync_db::start_sync_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let report = match sync_with_lease(lease, sheet, catalog, options).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(run_id = run.id, error = %e, "sync pass aborted");
            fail_run_best_effort(pool, run.id, e.to_string()).await;
            return Err(e.into());
        }
    };

    if let Err(err) = sheetsync_db::complete_sync_run(pool, run.id, run_counts(&report)).await {
        fail_run_best_effort(pool, run.id, format!("{err:#}")).await;
        return Err(err.into());
    }

    if report.lease_lost {
        tracing::warn!(
            run_id = run.id,
            watermark = report.state.last_processed_row,
            "pass stopped early after losing the sync lease"
        );
    }
    if report.outcome_write_failures > 0 {
        tracing::warn!(
            run_id = run.id,
            failures = report.outcome_write_failures,
            "some row outcomes could not be written to the sheet"
        );
    }
    Ok(report)
}

/// Maps and validates the pending range, printing each row, without side
/// effects.
pub(crate) async fn run_dry_run(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let sheet = crate::sources::build_sheet(config)?;
    let store = PgStateStore::new(pool.clone());

    let table = sheet.read_table().await?;
    let state = match load_sync_state(&store).await? {
        Some(state) => state,
        None => {
            println!("dry-run: tracking not initialized; a real pass would start at the current end");
            SyncState::new(table.last_row())
        }
    };

    let rows = preview_pass(state, &table, config.status_column);
    if rows.is_empty() {
        println!(
            "dry-run: no new rows (watermark {}, last row {})",
            state.last_processed_row,
            table.last_row()
        );
        return Ok(());
    }

    for preview in &rows {
        match &preview.result {
            Ok(product) => {
                println!("row {}: would create", preview.row);
                println!("{}", serde_json::to_string_pretty(product)?);
            }
            Err(e) => println!("row {}: ERROR: {e}", preview.row),
        }
    }
    let valid = rows.iter().filter(|r| r.result.is_ok()).count();
    println!(
        "dry-run: {} row(s) pending, {valid} would be sent, {} would fail",
        rows.len(),
        rows.len() - valid
    );
    Ok(())
}

pub(crate) async fn run_reset(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let sheet = crate::sources::build_sheet(config)?;
    let store = PgStateStore::new(pool.clone());
    let options = PassOptions::from_config(config);

    let state = reset_tracking(&store, sheet.as_ref(), options.lease_ttl).await?;
    println!(
        "tracking reset: watermark now at row {}",
        state.last_processed_row
    );
    Ok(())
}

pub(crate) fn summarize(report: &PassReport) -> String {
    if report.is_idle() {
        return format!(
            "no new rows (watermark {})",
            report.state.last_processed_row
        );
    }
    let summary = format!(
        "synced rows {}..={}: {} succeeded, {} failed, {} blank skipped",
        first_pending_row(report.previous),
        report.state.last_processed_row,
        report.succeeded(),
        report.failed(),
        report.skipped_blank.len()
    );
    if report.lease_lost {
        format!("{summary} (stopped early: sync lease lost)")
    } else {
        summary
    }
}

fn run_counts(report: &PassReport) -> SyncRunCounts {
    let to_i32 = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
    let row = |r: u32| i32::try_from(r).unwrap_or(i32::MAX);
    let covered = !report.is_idle();
    SyncRunCounts {
        first_row: covered.then(|| row(first_pending_row(report.previous))),
        last_row: covered.then(|| row(report.state.last_processed_row)),
        attempted: to_i32(report.attempted()),
        succeeded: to_i32(report.succeeded()),
        failed: to_i32(report.failed()),
        skipped: to_i32(report.skipped_blank.len()),
    }
}

/// Attempt to mark a sync run as failed; log if that also fails.
pub(crate) async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = sheetsync_db::fail_sync_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark sync run as failed"
        );
    }
}

//! One scan of the source table: every row past the watermark is mapped,
//! validated, created remotely and marked with its outcome.

use std::time::Duration;

use sheetsync_catalog::CatalogApi;
use sheetsync_core::{AppConfig, CellValue, Product, StateStore, SyncState};
use sheetsync_sheets::{is_blank_row, SheetSource, SheetTable};

use crate::error::{PassError, RowError};
use crate::lease::PassLease;
use crate::mapper::map_row;
use crate::outcome::RowOutcome;
use crate::tracker::{advance_state, SyncTracker};
use crate::validate::validate_product;

/// Knobs for a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOptions {
    /// Zero-based column receiving outcome text.
    pub status_column: usize,
    /// Pause between consecutive remote create calls.
    pub row_delay: Duration,
    /// Expiry of the pass lease.
    pub lease_ttl: Duration,
}

impl PassOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            status_column: config.status_column,
            row_delay: Duration::from_millis(config.row_delay_ms),
            lease_ttl: Duration::from_secs(config.lease_ttl_secs),
        }
    }
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            status_column: 25,
            row_delay: Duration::ZERO,
            lease_ttl: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowReport {
    pub row: u32,
    pub outcome: RowOutcome,
}

/// Everything a pass did, plus the state to persist afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub previous: SyncState,
    pub state: SyncState,
    /// Attempted rows in ascending order.
    pub rows: Vec<RowReport>,
    /// Blank rows inside the range; no outcome was written for them.
    pub skipped_blank: Vec<u32>,
    /// Outcomes that could not be recorded in the sheet.
    pub outcome_write_failures: usize,
    /// The pass stopped early because its lease could not be renewed; `state`
    /// covers only the rows before the first unattempted one.
    pub lease_lost: bool,
}

impl PassReport {
    fn idle(state: SyncState) -> Self {
        Self {
            previous: state,
            state,
            rows: Vec::new(),
            skipped_blank: Vec::new(),
            outcome_write_failures: 0,
            lease_lost: false,
        }
    }

    /// `true` when there were no new rows.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.previous == self.state && self.rows.is_empty() && self.skipped_blank.is_empty()
    }

    #[must_use]
    pub fn attempted(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    #[must_use]
    pub fn outcome_for(&self, row: u32) -> Option<&RowOutcome> {
        self.rows.iter().find(|r| r.row == row).map(|r| &r.outcome)
    }
}

/// First sheet row a pass may attempt. Row 1 is the header and never data.
#[must_use]
pub fn first_pending_row(state: SyncState) -> u32 {
    state.last_processed_row.saturating_add(1).max(2)
}

/// Number of rows a pass over `table` would cover, blank rows included.
#[must_use]
pub fn pending_rows(state: SyncState, table: &SheetTable) -> u32 {
    let last = table.last_row();
    let first = first_pending_row(state);
    if last < first {
        0
    } else {
        last - first + 1
    }
}

/// Runs one pass over an already-read `table`.
///
/// Every row in `(state, table.last_row()]` is attempted exactly once and
/// its outcome written through `sheet`. Row failures never stop the pass;
/// the returned state always covers the whole range. Persisting that state
/// is the caller's job.
pub async fn run_pass(
    state: SyncState,
    table: &SheetTable,
    sheet: &dyn SheetSource,
    catalog: &dyn CatalogApi,
    options: &PassOptions,
) -> PassReport {
    execute_pass(state, table, sheet, catalog, options, None).await
}

/// Row loop behind [`run_pass`]. With a `lease`, the lease is renewed before
/// every remote call and the loop stops at the first failed renewal.
async fn execute_pass(
    state: SyncState,
    table: &SheetTable,
    sheet: &dyn SheetSource,
    catalog: &dyn CatalogApi,
    options: &PassOptions,
    lease: Option<&PassLease<'_>>,
) -> PassReport {
    let last_row = table.last_row();
    if last_row <= state.last_processed_row {
        tracing::info!(
            watermark = state.last_processed_row,
            last_row,
            "no new rows"
        );
        return PassReport::idle(state);
    }

    let first_row = first_pending_row(state);
    tracing::info!(
        watermark = state.last_processed_row,
        first_row,
        last_row,
        "processing new rows"
    );

    let mut report = PassReport::idle(state);
    let mut remote_calls = 0_usize;
    let mut covered = last_row;

    for row in first_row..=last_row {
        let cells = table.row(row).unwrap_or(&[]);
        if is_blank_row(cells) {
            tracing::debug!(row, "blank row, skipping");
            report.skipped_blank.push(row);
            continue;
        }

        let outcome = match prepare_product(&table.headers, cells, options.status_column) {
            Err(err) => RowOutcome::Failed(err),
            Ok(product) => {
                if remote_calls > 0 && !options.row_delay.is_zero() {
                    tokio::time::sleep(options.row_delay).await;
                }
                if let Some(lease) = lease {
                    if !lease.renew().await {
                        tracing::warn!(row, "lease lost, stopping pass before this row");
                        report.lease_lost = true;
                        covered = row - 1;
                        break;
                    }
                }
                remote_calls += 1;
                match catalog.create_product(&product).await {
                    Ok(created) => RowOutcome::synced_now(created.id),
                    Err(err) => RowOutcome::Failed(RowError::from(err)),
                }
            }
        };

        match &outcome {
            RowOutcome::Synced { product_id, .. } => {
                tracing::info!(row, product_id = %product_id, "row synced");
            }
            RowOutcome::Failed(err) => {
                tracing::warn!(row, kind = ?err.kind(), error = %err, "row failed");
            }
        }

        if let Err(e) = sheet
            .write_outcome(row, options.status_column, &outcome.cell_text())
            .await
        {
            tracing::error!(row, error = %e, "failed to record row outcome");
            report.outcome_write_failures += 1;
        }
        report.rows.push(RowReport { row, outcome });
    }

    if let Err(e) = sheet.flush().await {
        tracing::error!(
            sheet = %sheet.describe(),
            error = %e,
            "failed to flush row outcomes"
        );
        report.outcome_write_failures = report.rows.len();
    }

    report.state = advance_state(state, covered);
    tracing::info!(
        watermark = report.state.last_processed_row,
        attempted = report.attempted(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        blank = report.skipped_blank.len(),
        lease_lost = report.lease_lost,
        "pass complete"
    );
    report
}

pub(crate) fn prepare_product(
    headers: &[String],
    cells: &[CellValue],
    status_column: usize,
) -> Result<Product, RowError> {
    let product = map_row(headers, cells, Some(status_column));
    validate_product(&product)?;
    Ok(product)
}

/// One complete invocation: take the lease, read the table, run the pass and
/// persist the new watermark.
///
/// An uninitialized watermark is first set to the current end of the table,
/// so the pass has nothing to do.
///
/// # Errors
///
/// - [`PassError::LeaseHeld`] if another pass is running; nothing is touched.
/// - [`PassError::Sheet`] if the table cannot be read.
/// - [`PassError::State`] if the watermark cannot be read or saved.
pub async fn sync_once(
    store: &dyn StateStore,
    sheet: &dyn SheetSource,
    catalog: &dyn CatalogApi,
    options: &PassOptions,
) -> Result<PassReport, PassError> {
    let lease = PassLease::acquire(store, options.lease_ttl).await?;
    let result = sync_with_lease(&lease, sheet, catalog, options).await;
    lease.release().await;
    result
}

/// [`sync_once`] for a caller that already holds the pass lease and
/// releases it afterwards.
///
/// The lease is renewed before each remote call. If a renewal fails the pass
/// stops, and only the rows before the unattempted one are marked processed.
///
/// # Errors
///
/// - [`PassError::Sheet`] if the table cannot be read.
/// - [`PassError::State`] if the watermark cannot be read or saved.
pub async fn sync_with_lease(
    lease: &PassLease<'_>,
    sheet: &dyn SheetSource,
    catalog: &dyn CatalogApi,
    options: &PassOptions,
) -> Result<PassReport, PassError> {
    let store = lease.store();
    let table = sheet.read_table().await?;
    let tracker = SyncTracker::new(store);
    let state = match tracker.current().await? {
        Some(state) => state,
        None => {
            tracing::warn!(
                sheet = %sheet.describe(),
                "tracking was never initialized; starting from the current last row"
            );
            tracker.initialize(table.last_row()).await?
        }
    };

    let report = execute_pass(state, &table, sheet, catalog, options, Some(lease)).await;
    if report.state != state {
        tracker.advance(report.state.last_processed_row).await?;
    }
    Ok(report)
}

/// Sets the watermark to the current end of the table unless already set.
///
/// # Errors
///
/// Returns [`PassError`] if the lease is held or the table or store fails.
pub async fn initialize_tracking(
    store: &dyn StateStore,
    sheet: &dyn SheetSource,
    lease_ttl: Duration,
) -> Result<SyncState, PassError> {
    let lease = PassLease::acquire(store, lease_ttl).await?;
    let result = initialize_locked(store, sheet).await;
    lease.release().await;
    result
}

async fn initialize_locked(
    store: &dyn StateStore,
    sheet: &dyn SheetSource,
) -> Result<SyncState, PassError> {
    let table = sheet.read_table().await?;
    Ok(SyncTracker::new(store).initialize(table.last_row()).await?)
}

/// Forces the watermark to the current end of the table, skipping any
/// backlog.
///
/// # Errors
///
/// Returns [`PassError`] if the lease is held or the table or store fails.
pub async fn reset_tracking(
    store: &dyn StateStore,
    sheet: &dyn SheetSource,
    lease_ttl: Duration,
) -> Result<SyncState, PassError> {
    let lease = PassLease::acquire(store, lease_ttl).await?;
    let result = reset_locked(store, sheet).await;
    lease.release().await;
    result
}

async fn reset_locked(
    store: &dyn StateStore,
    sheet: &dyn SheetSource,
) -> Result<SyncState, PassError> {
    let table = sheet.read_table().await?;
    Ok(SyncTracker::new(store).reset(table.last_row()).await?)
}

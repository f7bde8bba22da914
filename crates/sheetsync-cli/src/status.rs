use sheetsync_core::{column_letter, load_sync_state, AppConfig};
use sheetsync_db::PgStateStore;
use sheetsync_engine::pending_rows;

pub(crate) async fn run_status(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    limit: i64,
) -> anyhow::Result<()> {
    let sheet = crate::sources::build_sheet(config)?;
    let store = PgStateStore::new(pool.clone());

    println!("source:        {}", sheet.describe());
    println!("outcome col:   {}", column_letter(config.status_column));

    let state = load_sync_state(&store).await?;
    match state {
        Some(state) => println!("watermark:     row {}", state.last_processed_row),
        None => println!("watermark:     not initialized (run `sheetsync setup`)"),
    }

    match sheet.read_table().await {
        Ok(table) => {
            println!("last row:      {}", table.last_row());
            if let Some(state) = state {
                println!("pending rows:  {}", pending_rows(state, &table));
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not read sheet for status");
            println!("last row:      unavailable ({e})");
        }
    }

    let runs = sheetsync_db::list_sync_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no sync runs recorded");
        return Ok(());
    }
    println!();
    println!("recent runs:");
    for run in &runs {
        let range = match (run.first_row, run.last_row) {
            (Some(first), Some(last)) => format!("rows {first}..={last}"),
            _ => "no rows".to_string(),
        };
        println!(
            "  #{:<5} {:<9} {:<10} {}  {range}  ok={} err={} blank={}{}",
            run.id,
            run.trigger_source,
            run.status,
            run.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            run.rows_succeeded,
            run.rows_failed,
            run.rows_skipped,
            run.error_message
                .as_deref()
                .map(|m| format!("  ({m})"))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

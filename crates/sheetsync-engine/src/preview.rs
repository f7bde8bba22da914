//! Dry-run view of the pending range: mapping and validation only.

use sheetsync_core::{Product, SyncState};
use sheetsync_sheets::{is_blank_row, SheetTable};

use crate::error::RowError;
use crate::pass::{first_pending_row, prepare_product};

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub row: u32,
    pub result: Result<Product, RowError>,
}

/// Maps and validates every non-blank row a pass from `state` would attempt.
///
/// No remote calls, no outcome writes, no watermark change.
#[must_use]
pub fn preview_pass(state: SyncState, table: &SheetTable, status_column: usize) -> Vec<PreviewRow> {
    let last_row = table.last_row();
    (first_pending_row(state)..=last_row)
        .filter_map(|row| {
            let cells = table.row(row).unwrap_or(&[]);
            if is_blank_row(cells) {
                return None;
            }
            Some(PreviewRow {
                row,
                result: prepare_product(&table.headers, cells, status_column),
            })
        })
        .collect()
}

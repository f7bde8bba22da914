//! In-memory snapshot of a source table.

use sheetsync_core::CellValue;

/// A header row plus the data rows below it, as read in one go.
///
/// Row numbers used throughout are sheet row numbers: 1-based, with the
/// header on row 1 and the first data row on row 2.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table from a raw grid whose first row is the header.
    ///
    /// Header cells are rendered to text; an empty grid yields an empty table.
    #[must_use]
    pub fn from_grid(mut grid: Vec<Vec<CellValue>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let header_cells = grid.remove(0);
        let headers = header_cells.iter().map(CellValue::to_text).collect();
        Self {
            headers,
            rows: grid,
        }
    }

    /// Sheet row number of the last row with data, counting the header.
    ///
    /// A table holding only a header returns `1`; a completely empty table
    /// returns `0`.
    #[must_use]
    pub fn last_row(&self) -> u32 {
        if self.headers.is_empty() && self.rows.is_empty() {
            return 0;
        }
        u32::try_from(self.rows.len())
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1)
    }

    /// Returns the cells of a data row by sheet row number.
    #[must_use]
    pub fn row(&self, row: u32) -> Option<&[CellValue]> {
        let idx = usize::try_from(row.checked_sub(2)?).ok()?;
        self.rows.get(idx).map(Vec::as_slice)
    }
}

/// `true` when every cell, rendered and concatenated, is only whitespace.
#[must_use]
pub fn is_blank_row(cells: &[CellValue]) -> bool {
    cells.iter().all(|cell| cell.to_text().trim().is_empty())
}

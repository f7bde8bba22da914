//! In-memory source table, used by tests and previews.

use async_trait::async_trait;
use sheetsync_core::CellValue;
use tokio::sync::Mutex;

use crate::error::SheetError;
use crate::table::SheetTable;
use crate::SheetSource;

#[derive(Debug, Default)]
pub struct MemorySheet {
    table: Mutex<SheetTable>,
    fail_reads: bool,
}

impl MemorySheet {
    #[must_use]
    pub fn new(table: SheetTable) -> Self {
        Self {
            table: Mutex::new(table),
            fail_reads: false,
        }
    }

    /// Builds a sheet from string cells; `""` becomes an empty cell.
    #[must_use]
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let headers = headers.iter().map(|h| (*h).to_owned()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
            .collect();
        Self::new(SheetTable::new(headers, rows))
    }

    /// A sheet whose reads always fail, for exercising fatal pass errors.
    #[must_use]
    pub fn unreadable() -> Self {
        Self {
            table: Mutex::default(),
            fail_reads: true,
        }
    }

    /// Appends a data row, as a user typing into the sheet would.
    pub async fn push_row(&self, cells: Vec<CellValue>) {
        self.table.lock().await.rows.push(cells);
    }

    /// Returns the text in `column` of sheet row `row`, if any.
    pub async fn cell_text(&self, row: u32, column: usize) -> Option<String> {
        let table = self.table.lock().await;
        table
            .row(row)
            .and_then(|cells| cells.get(column))
            .filter(|cell| !cell.is_blank())
            .map(CellValue::to_text)
    }

    pub async fn snapshot(&self) -> SheetTable {
        self.table.lock().await.clone()
    }
}

#[async_trait]
impl SheetSource for MemorySheet {
    async fn read_table(&self) -> Result<SheetTable, SheetError> {
        if self.fail_reads {
            return Err(SheetError::Io {
                path: "memory".to_string(),
                source: std::io::Error::other("sheet is unreadable"),
            });
        }
        Ok(self.table.lock().await.clone())
    }

    async fn write_outcome(&self, row: u32, column: usize, text: &str) -> Result<(), SheetError> {
        let mut table = self.table.lock().await;
        let idx = row
            .checked_sub(2)
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < table.rows.len())
            .ok_or(SheetError::RowOutOfRange { row })?;

        let cells = &mut table.rows[idx];
        if cells.len() <= column {
            cells.resize(column + 1, CellValue::Empty);
        }
        cells[column] = CellValue::from(text);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outcome_lands_in_the_row() {
        let sheet = MemorySheet::from_rows(&["Title"], &[&["Widget"]]);
        sheet.write_outcome(2, 3, "SUCCESS").await.unwrap();

        assert_eq!(sheet.cell_text(2, 3).await.as_deref(), Some("SUCCESS"));
        let table = sheet.read_table().await.unwrap();
        assert_eq!(table.row(2).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn outcome_outside_table_is_rejected() {
        let sheet = MemorySheet::from_rows(&["Title"], &[&["Widget"]]);
        assert!(sheet.write_outcome(1, 0, "x").await.is_err());
        assert!(sheet.write_outcome(3, 0, "x").await.is_err());
    }

    #[tokio::test]
    async fn unreadable_sheet_fails_reads() {
        let sheet = MemorySheet::unreadable();
        assert!(sheet.read_table().await.is_err());
    }
}

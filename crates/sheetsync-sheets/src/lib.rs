//! The source-table boundary: where product rows come from and where row
//! outcomes are written back.

pub mod csv_file;
pub mod error;
pub mod google;
pub mod memory;
pub mod table;

use async_trait::async_trait;

pub use csv_file::CsvSheet;
pub use error::SheetError;
pub use google::GoogleSheet;
pub use memory::MemorySheet;
pub use table::{is_blank_row, SheetTable};

/// A flat table with a header row that can be read whole and annotated
/// one cell at a time.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Reads the header and every data row.
    async fn read_table(&self) -> Result<SheetTable, SheetError>;

    /// Writes `text` into the cell at sheet row `row` (1-based), zero-based
    /// `column`. Implementations may buffer until [`SheetSource::flush`].
    async fn write_outcome(&self, row: u32, column: usize, text: &str) -> Result<(), SheetError>;

    /// Persists any buffered writes.
    async fn flush(&self) -> Result<(), SheetError> {
        Ok(())
    }

    /// Short human-readable label for logs.
    fn describe(&self) -> String;
}

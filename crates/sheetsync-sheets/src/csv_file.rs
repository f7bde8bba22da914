//! CSV file source.
//!
//! The whole file is read on every pass. Outcome writes are buffered and
//! applied in one rewrite on [`SheetSource::flush`], going through a
//! temporary sibling file so a crash mid-write never truncates the sheet.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sheetsync_core::CellValue;
use tokio::sync::Mutex;

use crate::error::SheetError;
use crate::table::SheetTable;
use crate::SheetSource;

#[derive(Debug, Clone)]
struct PendingWrite {
    row: u32,
    column: usize,
    text: String,
}

pub struct CsvSheet {
    path: PathBuf,
    pending: Mutex<Vec<PendingWrite>>,
}

impl CsvSheet {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SheetSource for CsvSheet {
    async fn read_table(&self) -> Result<SheetTable, SheetError> {
        let path = self.path.clone();
        let records = run_blocking(move || read_records(&path)).await?;
        let grid = records
            .into_iter()
            .map(|record| record.into_iter().map(CellValue::from).collect())
            .collect();
        Ok(SheetTable::from_grid(grid))
    }

    async fn write_outcome(&self, row: u32, column: usize, text: &str) -> Result<(), SheetError> {
        if row < 2 {
            return Err(SheetError::RowOutOfRange { row });
        }
        self.pending.lock().await.push(PendingWrite {
            row,
            column,
            text: text.to_owned(),
        });
        Ok(())
    }

    async fn flush(&self) -> Result<(), SheetError> {
        let writes = std::mem::take(&mut *self.pending.lock().await);
        if writes.is_empty() {
            return Ok(());
        }

        let path = self.path.clone();
        let count = writes.len();
        run_blocking(move || {
            let mut records = read_records(&path)?;
            for write in &writes {
                apply_write(&mut records, write)?;
            }
            write_records(&path, &records)
        })
        .await?;

        tracing::debug!(path = %self.path.display(), count, "flushed outcome writes to csv");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, SheetError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SheetError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SheetError::Io {
            path: "<blocking task>".to_string(),
            source: std::io::Error::other(e.to_string()),
        })?
}

fn csv_error(path: &Path, source: csv::Error) -> SheetError {
    SheetError::Csv {
        path: path.display().to_string(),
        source,
    }
}

fn read_records(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_owned).collect())
                .map_err(|e| csv_error(path, e))
        })
        .collect()
}

fn apply_write(records: &mut [Vec<String>], write: &PendingWrite) -> Result<(), SheetError> {
    let idx = usize::try_from(write.row - 1).map_err(|_| SheetError::RowOutOfRange { row: write.row })?;
    let record = records
        .get_mut(idx)
        .ok_or(SheetError::RowOutOfRange { row: write.row })?;
    if record.len() <= write.column {
        record.resize(write.column + 1, String::new());
    }
    record[write.column].clone_from(&write.text);
    Ok(())
}

fn write_records(path: &Path, records: &[Vec<String>]) -> Result<(), SheetError> {
    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&tmp_path)
            .map_err(|e| csv_error(&tmp_path, e))?;
        for record in records {
            writer
                .write_record(record)
                .map_err(|e| csv_error(&tmp_path, e))?;
        }
        writer.flush().map_err(|e| SheetError::Io {
            path: tmp_path.display().to_string(),
            source: e,
        })?;
    }
    std::fs::rename(&tmp_path, path).map_err(|e| SheetError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

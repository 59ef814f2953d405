use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::num::NonZeroUsize;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::parser::{RawRow, Workbook, WorksheetRows};
use crate::pipeline::{self, CancelHandle, ImportJob, ImportReport};
use crate::sinks::BulkSink;

/// Records per sink call.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Queue slots reserved per worker.
pub const DEFAULT_QUEUE_ROWS_PER_WORKER: usize = 1000;

/// Configures the worker pool, batch size and queue capacity of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    workers: Option<usize>,
    batch_size: usize,
    queue_rows_per_worker: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            workers: None,
            batch_size: DEFAULT_BATCH_SIZE,
            queue_rows_per_worker: DEFAULT_QUEUE_ROWS_PER_WORKER,
        }
    }

    /// Fixes the worker count instead of using the available parallelism.
    #[must_use]
    pub const fn with_workers(mut self, count: usize) -> Self {
        self.workers = Some(at_least_one(count));
        self
    }

    #[must_use]
    pub const fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = at_least_one(size);
        self
    }

    #[must_use]
    pub const fn with_queue_rows_per_worker(mut self, rows: usize) -> Self {
        self.queue_rows_per_worker = at_least_one(rows);
        self
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        })
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Bounded queue capacity: workers × rows per worker.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.workers().saturating_mul(self.queue_rows_per_worker)
    }
}

const fn at_least_one(value: usize) -> usize {
    if value == 0 { 1 } else { value }
}

/// Imports supplier spreadsheets into a bulk sink.
///
/// Imports are not transactional: when a row or a batch fails, batches the
/// sink already accepted stay written. Re-importing the same file after a
/// failure can therefore insert earlier rows twice.
pub struct SupplierImporter<S: BulkSink> {
    sink: S,
    options: ImportOptions,
}

impl<S: BulkSink> SupplierImporter<S> {
    #[must_use]
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            options: ImportOptions::new(),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn options(&self) -> &ImportOptions {
        &self.options
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Imports every data row of the spreadsheet in `source`.
    ///
    /// # Errors
    ///
    /// Returns the single error of the import: a setup failure, the first
    /// validation failure, or the first sink failure.
    pub fn import<R: Read + Seek>(&self, source: R) -> Result<ImportReport> {
        pipeline::run(source, &self.sink, &self.options, ImportJob::new())
    }

    /// Like [`import`](Self::import), stopping early once `cancel` fires.
    ///
    /// # Errors
    ///
    /// As for [`import`](Self::import); a cancellation with no other failure
    /// yields [`Error::Cancelled`].
    pub fn import_with_cancel<R: Read + Seek>(&self, source: R, cancel: &CancelHandle) -> Result<ImportReport> {
        let job = ImportJob::with_cancel_handle(cancel.clone());
        pipeline::run(source, &self.sink, &self.options, job)
    }

    /// Opens `path` and imports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, or as for [`import`](Self::import).
    pub fn import_path(&self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let file = File::open(path.as_ref())?;
        self.import(BufReader::new(file))
    }
}

/// Shape of a spreadsheet without importing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub worksheet: String,
    pub shared_strings: usize,
    /// Header cells up to the last non-empty one.
    pub header: Vec<String>,
    pub data_rows: usize,
}

/// Decodes the worksheet of `source` and summarises it.
///
/// # Errors
///
/// Returns the setup errors an import would report, including
/// [`Error::EmptySheet`] for a sheet without rows.
pub fn inspect<R: Read + Seek>(source: R) -> Result<SheetSummary> {
    let mut workbook = Workbook::open(source)?;
    let shared = workbook.shared_strings()?;
    let worksheet = workbook.worksheet()?;
    let mut rows = WorksheetRows::new(&worksheet.xml, &worksheet.name, &shared);

    let header = rows.try_next()?.ok_or(Error::EmptySheet)?;
    let mut data_rows = 0;
    while rows.try_next()?.is_some() {
        data_rows += 1;
    }
    Ok(SheetSummary {
        worksheet: worksheet.name.clone(),
        shared_strings: shared.len(),
        header: trimmed_cells(&header),
        data_rows,
    })
}

/// Opens `path` and summarises its worksheet.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, or as for [`inspect`].
pub fn inspect_path(path: impl AsRef<Path>) -> Result<SheetSummary> {
    let file = File::open(path.as_ref())?;
    inspect(BufReader::new(file))
}

fn trimmed_cells(row: &RawRow) -> Vec<String> {
    let cells = row.as_slice();
    let len = cells.iter().rposition(|cell| !cell.is_empty()).map_or(0, |last| last + 1);
    cells[..len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_clamp_zero() {
        let options = ImportOptions::new()
            .with_workers(0)
            .with_batch_size(0)
            .with_queue_rows_per_worker(0);
        assert_eq!(options.workers(), 1);
        assert_eq!(options.batch_size(), 1);
        assert_eq!(options.queue_capacity(), 1);
    }

    #[test]
    fn queue_scales_with_workers() {
        let options = ImportOptions::new().with_workers(4);
        assert_eq!(options.queue_capacity(), 4 * DEFAULT_QUEUE_ROWS_PER_WORKER);
        assert_eq!(options.batch_size(), DEFAULT_BATCH_SIZE);
        assert!(ImportOptions::default().workers() >= 1);
    }

    #[test]
    fn header_is_trimmed() {
        let row = RawRow::empty().with(0, "a").with(2, "c");
        assert_eq!(trimmed_cells(&row), vec!["a".to_owned(), String::new(), "c".to_owned()]);
        assert!(trimmed_cells(&RawRow::empty()).is_empty());
    }
}

use std::io::Write;
use std::sync::Mutex;

use crate::error::SinkError;
use crate::record::SupplierRecord;

use super::{BulkSink, poisoned};

/// Writes one JSON object per record, newline separated.
///
/// Batches are written under a lock, so the lines of one batch stay together.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer cannot be flushed.
    pub fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| poisoned("json lines"))?;
        writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer cannot be flushed.
    pub fn into_inner(self) -> Result<W, SinkError> {
        let mut writer = self.writer.into_inner().map_err(|_| poisoned("json lines"))?;
        writer.flush()?;
        Ok(writer)
    }
}

impl<W: Write + Send> BulkSink for JsonLinesSink<W> {
    fn insert_many(&self, records: &[SupplierRecord]) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| poisoned("json lines"))?;
        for record in records {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

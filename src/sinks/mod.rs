mod csv;
mod jsonl;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SinkError;
use crate::record::SupplierRecord;

pub use self::csv::CsvSink;
pub use self::jsonl::JsonLinesSink;

/// Persists batches of validated records.
///
/// `insert_many` may be called concurrently from several workers during a
/// single import and always receives a non-empty batch.
pub trait BulkSink: Sync {
    /// Writes the whole batch, or reports why it could not be written.
    fn insert_many(&self, records: &[SupplierRecord]) -> Result<(), SinkError>;
}

impl<S: BulkSink + ?Sized> BulkSink for &S {
    fn insert_many(&self, records: &[SupplierRecord]) -> Result<(), SinkError> {
        (**self).insert_many(records)
    }
}

impl<S: BulkSink + ?Sized + Send> BulkSink for Arc<S> {
    fn insert_many(&self, records: &[SupplierRecord]) -> Result<(), SinkError> {
        (**self).insert_many(records)
    }
}

impl<S: BulkSink + ?Sized> BulkSink for Box<S> {
    fn insert_many(&self, records: &[SupplierRecord]) -> Result<(), SinkError> {
        (**self).insert_many(records)
    }
}

/// Keeps every inserted record in memory, along with the size of each batch.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<SupplierRecord>,
    batch_sizes: Vec<usize>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // Plain data: a panicking writer cannot leave it half-updated.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Snapshot of the records inserted so far, in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<SupplierRecord> {
        self.state().records.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().records.is_empty()
    }

    /// Sizes of the batches received, in arrival order.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state().batch_sizes.clone()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<SupplierRecord> {
        self.inner
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .records
    }
}

impl BulkSink for MemorySink {
    fn insert_many(&self, records: &[SupplierRecord]) -> Result<(), SinkError> {
        let mut state = self.state();
        state.records.extend_from_slice(records);
        state.batch_sizes.push(records.len());
        Ok(())
    }
}

pub(crate) fn poisoned(sink: &str) -> SinkError {
    format!("{sink} sink lock poisoned by a panicking writer").into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RawRow;
    use crate::record::build_record;

    fn sample() -> SupplierRecord {
        build_record(&RawRow::empty().with(1, "Contoso"))
    }

    #[test]
    fn memory_sink_tracks_batches() {
        let sink = MemorySink::new();
        sink.insert_many(&[sample(), sample()]).expect("insert");
        sink.insert_many(&[sample()]).expect("insert");
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.batch_sizes(), vec![2, 1]);
        assert_eq!(sink.into_records()[0].partner_name, "Contoso");
    }

    #[test]
    fn shared_handles_forward_to_the_sink() {
        let sink = Arc::new(MemorySink::new());
        let handle: &dyn BulkSink = &sink;
        handle.insert_many(&[sample()]).expect("insert");
        assert_eq!(sink.len(), 1);
    }
}

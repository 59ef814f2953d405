use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::Error;

/// Cloneable trigger for cancelling a running import from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Shared state of one import: cancellation signal, first-error slot and
/// running totals.
///
/// Every producer and worker thread holds a shared reference; the owner
/// reads the outcome after all of them have been joined.
#[derive(Debug, Default)]
pub struct ImportJob {
    cancel: CancelHandle,
    error: OnceLock<Error>,
    rows: AtomicU64,
    records: AtomicU64,
    batches: AtomicU64,
}

impl ImportJob {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A job that also stops when `handle` is cancelled.
    #[must_use]
    pub fn with_cancel_handle(handle: CancelHandle) -> Self {
        Self {
            cancel: handle,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stores `err` if no error was recorded yet, then cancels the job.
    ///
    /// Returns `true` when this call won the slot; later errors are discarded.
    pub fn record_error(&self, err: Error) -> bool {
        let mut pending = Some(err);
        self.error.get_or_init(|| pending.take().unwrap_or(Error::Cancelled));
        let won = pending.is_none();
        if won {
            if let Some(first) = self.error.get() {
                tracing::warn!(error = %first, kind = ?first.kind(), "import failed; cancelling");
            }
        } else if let Some(lost) = pending {
            tracing::debug!(error = %lost, "discarding error after the first");
        }
        self.cancel();
        won
    }

    pub(crate) fn row_queued(&self) {
        self.rows.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn batch_flushed(&self, len: usize) {
        self.records.fetch_add(len as u64, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Totals so far.
    #[must_use]
    pub fn report(&self) -> ImportReport {
        ImportReport {
            rows: self.rows.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }

    /// Consumes the job once all threads are joined.
    ///
    /// # Errors
    ///
    /// Returns the first recorded error, or [`Error::Cancelled`] when the job
    /// was cancelled without one.
    pub fn finish(self) -> Result<ImportReport, Error> {
        let report = self.report();
        let cancelled = self.is_cancelled();
        match self.error.into_inner() {
            Some(err) => Err(err),
            None if cancelled => Err(Error::Cancelled),
            None => Ok(report),
        }
    }
}

/// Totals of a successful import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportReport {
    /// Data rows handed to workers (header excluded).
    pub rows: u64,
    /// Records accepted by the sink.
    pub records: u64,
    /// Calls made to the sink.
    pub batches: u64,
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn first_error_wins() {
        let job = ImportJob::new();
        assert!(job.record_error(Error::EmptySheet));
        assert!(!job.record_error(Error::WorksheetMissing));
        assert!(job.is_cancelled());
        assert!(matches!(job.finish(), Err(Error::EmptySheet)));
    }

    #[test]
    fn concurrent_writers_leave_one_error() {
        let job = ImportJob::new();
        let winners: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| usize::from(job.record_error(Error::sink("boom".into())))))
                .collect();
            handles.into_iter().map(|h| h.join().expect("join")).sum()
        });
        assert_eq!(winners, 1);
        assert!(matches!(job.finish(), Err(Error::Sink { .. })));
    }

    #[test]
    fn external_cancel_without_error() {
        let handle = CancelHandle::new();
        let job = ImportJob::with_cancel_handle(handle.clone());
        job.row_queued();
        handle.cancel();
        assert!(job.is_cancelled());
        assert!(matches!(job.finish(), Err(Error::Cancelled)));
    }

    #[test]
    fn report_counts_batches() {
        let job = ImportJob::new();
        job.row_queued();
        job.row_queued();
        job.batch_flushed(2);
        assert_eq!(
            job.finish().expect("no error"),
            ImportReport {
                rows: 2,
                records: 2,
                batches: 1
            }
        );
    }
}

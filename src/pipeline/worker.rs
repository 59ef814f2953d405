use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{Mutex, PoisonError};

use crate::error::Error;
use crate::parser::RawRow;
use crate::record::{SupplierRecord, map_row};
use crate::sinks::BulkSink;

use super::job::ImportJob;

/// Feeds data rows into the queue until they run out, the job is cancelled,
/// or every worker has gone away.
///
/// Blocks while the queue is full.
pub(super) fn produce(rows: impl Iterator<Item = RawRow>, queue: SyncSender<RawRow>, job: &ImportJob) {
    for row in rows {
        if job.is_cancelled() {
            tracing::debug!("producer stopping on cancellation");
            break;
        }
        if queue.send(row).is_err() {
            tracing::debug!("producer stopping; no worker left");
            break;
        }
        job.row_queued();
    }
}

/// Worker loop: pull a row, map and validate it, and batch the record.
///
/// The cancellation flag is checked before each pull. Any partial batch is
/// flushed once more before returning, cancelled or not.
pub(super) fn consume<S: BulkSink + ?Sized>(
    id: usize,
    queue: &Mutex<Receiver<RawRow>>,
    sink: &S,
    batch_size: usize,
    job: &ImportJob,
) {
    let mut batch: Vec<SupplierRecord> = Vec::with_capacity(batch_size);
    loop {
        if job.is_cancelled() {
            break;
        }
        // `recv` never panics while holding the lock, so a poisoned guard is still usable.
        let next = queue.lock().unwrap_or_else(PoisonError::into_inner).recv();
        let Ok(row) = next else {
            break;
        };
        match map_row(&row) {
            Ok(record) => {
                batch.push(record);
                if batch.len() >= batch_size {
                    flush(id, sink, &mut batch, job);
                }
            }
            Err(err) => {
                job.record_error(Error::from(err));
            }
        }
    }
    if !batch.is_empty() {
        flush(id, sink, &mut batch, job);
    }
    tracing::debug!(worker = id, "worker finished");
}

fn flush<S: BulkSink + ?Sized>(id: usize, sink: &S, batch: &mut Vec<SupplierRecord>, job: &ImportJob) {
    match sink.insert_many(batch) {
        Ok(()) => {
            tracing::debug!(worker = id, records = batch.len(), "flushed batch");
            job.batch_flushed(batch.len());
        }
        Err(source) => {
            job.record_error(Error::sink(source));
        }
    }
    batch.clear();
}

//! Concurrent import: one producer feeding a bounded queue, a fixed pool of
//! workers mapping and batching rows, and a single first-error slot.

mod job;
mod worker;

use std::fmt;
use std::io::{Read, Seek};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::api::ImportOptions;
use crate::error::{Error, Result};
use crate::parser::{RawRow, Workbook, WorksheetRows};
use crate::sinks::BulkSink;

pub use job::{CancelHandle, ImportJob, ImportReport};

/// Lifecycle of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    /// Archive and shared-string table are loaded.
    Opened,
    /// Worksheet rows are being decoded into memory.
    Decoding,
    /// The producer is feeding the worker pool.
    Streaming,
    /// The queue is closed; workers empty it and flush their partial batches.
    Draining,
    Completed,
    Failed,
}

impl State {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Opened => "opened",
            Self::Decoding => "decoding",
            Self::Streaming => "streaming",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct Lifecycle {
    state: State,
}

impl Lifecycle {
    const fn new() -> Self {
        Self { state: State::Idle }
    }

    fn enter(&mut self, next: State) {
        tracing::debug!(from = %self.state, to = %next, "import state");
        self.state = next;
    }

    fn fail(&mut self, err: Error) -> Error {
        self.enter(State::Failed);
        err
    }
}

/// Runs a full import of `source` into `sink`.
///
/// Setup failures (unreadable archive, malformed XML, missing worksheet, no
/// data rows) are reported before any worker starts. After that the first
/// mapping or sink error wins and cancels the rest of the job; batches
/// already accepted by the sink are not rolled back.
///
/// # Errors
///
/// Returns the single error recorded for the import.
pub fn run<R, S>(source: R, sink: &S, options: &ImportOptions, job: ImportJob) -> Result<ImportReport>
where
    R: Read + Seek,
    S: BulkSink + ?Sized,
{
    let mut lifecycle = Lifecycle::new();
    let rows = match load_rows(source, &mut lifecycle) {
        Ok(rows) => rows,
        Err(err) => return Err(lifecycle.fail(err)),
    };
    if rows.len() <= 1 {
        return Err(lifecycle.fail(Error::EmptySheet));
    }

    lifecycle.enter(State::Streaming);
    stream(rows, sink, options, &job, &mut lifecycle);

    match job.finish() {
        Ok(report) => {
            lifecycle.enter(State::Completed);
            tracing::info!(
                rows = report.rows,
                records = report.records,
                batches = report.batches,
                "import completed"
            );
            Ok(report)
        }
        Err(err) => Err(lifecycle.fail(err)),
    }
}

fn load_rows<R: Read + Seek>(source: R, lifecycle: &mut Lifecycle) -> Result<Vec<RawRow>> {
    let mut workbook = Workbook::open(source)?;
    let shared = workbook.shared_strings()?;
    let worksheet = workbook.worksheet()?;
    lifecycle.enter(State::Opened);

    lifecycle.enter(State::Decoding);
    let rows = WorksheetRows::new(&worksheet.xml, &worksheet.name, &shared).collect::<Result<Vec<_>>>()?;
    tracing::debug!(
        worksheet = %worksheet.name,
        shared_strings = shared.len(),
        rows = rows.len(),
        "worksheet decoded"
    );
    Ok(rows)
}

fn stream<S: BulkSink + ?Sized>(
    rows: Vec<RawRow>,
    sink: &S,
    options: &ImportOptions,
    job: &ImportJob,
    lifecycle: &mut Lifecycle,
) {
    let workers = options.workers();
    let batch_size = options.batch_size();
    let (sender, receiver) = mpsc::sync_channel(options.queue_capacity());
    let receiver = Arc::new(Mutex::new(receiver));
    tracing::debug!(workers, batch_size, capacity = options.queue_capacity(), "starting workers");

    thread::scope(|scope| {
        for id in 0..workers {
            let queue = Arc::clone(&receiver);
            scope.spawn(move || worker::consume(id, &queue, sink, batch_size, job));
        }
        // Workers own the receiver from here on: once they all stop, sends fail.
        drop(receiver);

        // Header row is never mapped.
        worker::produce(rows.into_iter().skip(1), sender, job);
        lifecycle.enter(State::Draining);
    });
}

pub mod api;
pub mod error;
pub mod logger;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod sinks;

pub use crate::error::{Error, ErrorKind, Result};
pub use api::{ImportOptions, SheetSummary, SupplierImporter, inspect, inspect_path};
pub use pipeline::{CancelHandle, ImportReport};
pub use record::{Field, SupplierRecord, ValidationError};
pub use sinks::{BulkSink, CsvSink, JsonLinesSink, MemorySink};

/// Decodes every worksheet row of `source`, header included.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened, the worksheet part is
/// missing, or either part holds malformed XML.
pub fn read_rows<R: std::io::Read + std::io::Seek>(source: R) -> Result<Vec<parser::RawRow>> {
    parser::read_rows(source)
}

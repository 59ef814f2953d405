mod archive;
mod column;
mod shared_strings;
mod worksheet;
mod xml;

use std::io::{Read, Seek};

pub use archive::{SHARED_STRINGS_PART, WORKSHEET_PREFIX, Workbook, WorksheetPart};
pub use column::{column_index, column_letters};
pub use shared_strings::{SharedStringTable, parse_shared_strings};
pub use worksheet::{COLUMN_COUNT, RawRow, WorksheetRows};

/// Opens the archive, resolves shared strings and decodes every worksheet row.
///
/// The shared-string table is dropped once decoding finishes.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened, the worksheet part is
/// missing, or either part holds malformed XML.
pub fn read_rows<R: Read + Seek>(source: R) -> crate::Result<Vec<RawRow>> {
    let mut workbook = Workbook::open(source)?;
    let shared = workbook.shared_strings()?;
    let worksheet = workbook.worksheet()?;
    WorksheetRows::new(&worksheet.xml, &worksheet.name, &shared).collect()
}

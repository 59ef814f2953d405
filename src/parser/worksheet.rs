use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Part, Result};

use super::column::column_index;
use super::shared_strings::SharedStringTable;
use super::xml::{attr_value, read_text, skip_subtree};

/// Number of columns in the supplier sheet layout.
pub const COLUMN_COUNT: usize = 55;

const CELL_TYPE_SHARED: &str = "s";
const CELL_TYPE_INLINE: &str = "inlineStr";

/// Fixed-width row of raw cell text, addressed by 0-based column index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    cells: Box<[String]>,
}

impl Default for RawRow {
    fn default() -> Self {
        Self::empty()
    }
}

impl RawRow {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            cells: vec![String::new(); COLUMN_COUNT].into_boxed_slice(),
        }
    }

    /// Builder-style setter; indices outside the layout are ignored.
    #[must_use]
    pub fn with(mut self, index: usize, value: impl Into<String>) -> Self {
        self.set(index, value);
        self
    }

    /// Stores `value` at `index`, returning `false` when the index is outside the layout.
    pub fn set(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.cells.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Text at `index`, or empty text for an out-of-range index.
    #[must_use]
    pub fn get(&self, index: usize) -> &str {
        self.cells.get(index).map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(String::is_empty)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.cells
    }
}

enum Step {
    SheetDataStart,
    SheetDataEnd,
    RowStart,
    EmptyRow,
    Eof,
    Other,
}

/// Single-pass decoder over the `<row>` elements of a worksheet part.
///
/// Rows are produced lazily in document order; after an error the iterator
/// is exhausted.
pub struct WorksheetRows<'a> {
    reader: Reader<&'a [u8]>,
    shared: &'a SharedStringTable,
    part: Part,
    buf: Vec<u8>,
    in_sheet_data: bool,
    rows_emitted: u64,
    exhausted: bool,
}

impl<'a> WorksheetRows<'a> {
    #[must_use]
    pub fn new(xml: &'a [u8], part_name: &str, shared: &'a SharedStringTable) -> Self {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);
        Self {
            reader,
            shared,
            part: Part::worksheet(part_name),
            buf: Vec::new(),
            in_sheet_data: false,
            rows_emitted: 0,
            exhausted: false,
        }
    }

    #[must_use]
    pub const fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }

    /// Decodes the next row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Xml`] if the row or cell markup is malformed.
    #[cfg_attr(feature = "hotpath", hotpath::measure)]
    pub fn try_next(&mut self) -> Result<Option<RawRow>> {
        if self.exhausted {
            return Ok(None);
        }
        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.exhausted = true;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<RawRow>> {
        loop {
            let step = {
                let event = self
                    .reader
                    .read_event_into(&mut self.buf)
                    .map_err(|err| Error::xml(self.part.clone(), err))?;
                match event {
                    Event::Start(e) => match e.local_name().as_ref() {
                        b"sheetData" => Step::SheetDataStart,
                        b"row" if self.in_sheet_data => Step::RowStart,
                        _ => Step::Other,
                    },
                    Event::Empty(e) if self.in_sheet_data && e.local_name().as_ref() == b"row" => {
                        Step::EmptyRow
                    }
                    Event::End(e) if e.local_name().as_ref() == b"sheetData" => Step::SheetDataEnd,
                    Event::Eof => Step::Eof,
                    _ => Step::Other,
                }
            };
            self.buf.clear();

            match step {
                Step::SheetDataStart => self.in_sheet_data = true,
                Step::SheetDataEnd => self.in_sheet_data = false,
                Step::RowStart => {
                    let row = self.parse_row()?;
                    self.rows_emitted += 1;
                    return Ok(Some(row));
                }
                Step::EmptyRow => {
                    self.rows_emitted += 1;
                    return Ok(Some(RawRow::empty()));
                }
                Step::Eof => return Ok(None),
                Step::Other => {}
            }
        }
    }

    fn parse_row(&mut self) -> Result<RawRow> {
        let part = self.part.clone().at_row(self.rows_emitted + 1);
        let mut row = RawRow::empty();
        let mut buf = Vec::new();

        loop {
            match self
                .reader
                .read_event_into(&mut buf)
                .map_err(|err| Error::xml(part.clone(), err))?
            {
                Event::Start(e) if e.local_name().as_ref() == b"c" => {
                    let reference = attr_value(&e, b"r", &part)?;
                    let cell_type = attr_value(&e, b"t", &part)?;
                    let text = read_cell_body(&mut self.reader, cell_type.as_deref(), &part)?;
                    self.place(&mut row, reference.as_deref(), cell_type.as_deref(), text);
                }
                Event::Empty(e) if e.local_name().as_ref() == b"c" => {}
                Event::Start(e) => skip_subtree(&mut self.reader, &e, &part)?,
                Event::End(e) if e.local_name().as_ref() == b"row" => break,
                Event::Eof => return Err(Error::xml(part, "unexpected eof in <row>")),
                _ => {}
            }
            buf.clear();
        }

        Ok(row)
    }

    fn place(
        &self,
        row: &mut RawRow,
        reference: Option<&str>,
        cell_type: Option<&str>,
        text: String,
    ) {
        let Some(index) = reference.and_then(column_index) else {
            return;
        };
        if index >= COLUMN_COUNT {
            return;
        }
        if cell_type == Some(CELL_TYPE_SHARED) {
            row.set(index, self.shared.resolve_index(&text));
        } else {
            row.set(index, text);
        }
    }
}

impl Iterator for WorksheetRows<'_> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().transpose()
    }
}

/// Reads the children of an opened `<c>` element and returns its raw text.
///
/// The `<v>` child is used verbatim; inline-string cells fall back to the
/// text of their `<is>` child.
fn read_cell_body(
    reader: &mut Reader<&[u8]>,
    cell_type: Option<&str>,
    part: &Part,
) -> Result<String> {
    let mut buf = Vec::new();
    let mut value: Option<String> = None;
    let mut inline = String::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| Error::xml(part.clone(), err))?
        {
            Event::Start(e) if e.local_name().as_ref() == b"v" => {
                value = Some(read_text(reader, b"v", part)?);
            }
            Event::Start(e)
                if cell_type == Some(CELL_TYPE_INLINE) && e.local_name().as_ref() == b"is" =>
            {
                read_inline_string(reader, part, &mut inline)?;
            }
            Event::Start(e) => skip_subtree(reader, &e, part)?,
            Event::End(e) if e.local_name().as_ref() == b"c" => break,
            Event::Eof => return Err(Error::xml(part.clone(), "unexpected eof in <c>")),
            _ => {}
        }
        buf.clear();
    }

    Ok(value.unwrap_or(inline))
}

fn read_inline_string(reader: &mut Reader<&[u8]>, part: &Part, out: &mut String) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| Error::xml(part.clone(), err))?
        {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                out.push_str(&read_text(reader, b"t", part)?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"rPh" => {
                skip_subtree(reader, &e, part)?;
            }
            Event::Start(_) => depth += 1,
            Event::End(e) if depth == 0 && e.local_name().as_ref() == b"is" => break,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => return Err(Error::xml(part.clone(), "unexpected eof in <is>")),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

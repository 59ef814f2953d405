use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Part, Result};

use super::xml::{read_text, skip_subtree};

/// Deduplicated strings referenced by index from worksheet cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStringTable {
    items: Vec<String>,
}

impl SharedStringTable {
    #[must_use]
    pub const fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    /// Resolves the textual index stored in a shared-string cell.
    ///
    /// Non-numeric or out-of-range indices resolve to empty text.
    #[must_use]
    pub fn resolve_index(&self, raw: &str) -> &str {
        raw.trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| self.get(index))
            .unwrap_or("")
    }
}

/// Parses `xl/sharedStrings.xml` into an ordered table.
///
/// Rich-text items contribute the concatenation of their runs; phonetic
/// guide runs are not part of the displayed string and are skipped.
///
/// # Errors
///
/// Returns [`Error::Xml`] if the part is not well-formed.
#[cfg_attr(feature = "hotpath", hotpath::measure)]
pub fn parse_shared_strings(xml: &[u8]) -> Result<SharedStringTable> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut items = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| Error::xml(Part::SharedStrings, err))?
        {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                items.push(parse_si(&mut reader)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"si" => items.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(SharedStringTable { items })
}

fn parse_si(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| Error::xml(Part::SharedStrings, err))?
        {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                text.push_str(&read_text(reader, b"t", &Part::SharedStrings)?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"r" => {
                parse_run(reader, &mut text)?;
            }
            Event::Start(e) => skip_subtree(reader, &e, &Part::SharedStrings)?,
            Event::End(e) if e.local_name().as_ref() == b"si" => break,
            Event::Eof => {
                return Err(Error::xml(Part::SharedStrings, "unexpected eof in <si>"));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

fn parse_run(reader: &mut Reader<&[u8]>, text: &mut String) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| Error::xml(Part::SharedStrings, err))?
        {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                text.push_str(&read_text(reader, b"t", &Part::SharedStrings)?);
            }
            Event::Start(e) => skip_subtree(reader, &e, &Part::SharedStrings)?,
            Event::End(e) if e.local_name().as_ref() == b"r" => break,
            Event::Eof => {
                return Err(Error::xml(Part::SharedStrings, "unexpected eof in <r>"));
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

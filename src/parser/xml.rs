use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Part, Result};

/// Collects the text content of the element just opened, up to its end tag.
pub(super) fn read_text(reader: &mut Reader<&[u8]>, end: &[u8], part: &Part) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| Error::xml(part.clone(), err))?
        {
            Event::Text(e) => {
                let unescaped = e.unescape().map_err(|err| Error::xml(part.clone(), err))?;
                text.push_str(&unescaped);
            }
            Event::CData(e) => {
                let raw = std::str::from_utf8(&e)
                    .map_err(|err| Error::xml(part.clone(), err))?;
                text.push_str(raw);
            }
            Event::Start(e) => skip_subtree(reader, &e, part)?,
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::Eof => {
                return Err(Error::xml(part.clone(), "unexpected eof inside text element"));
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

/// Skips the element just opened, including all of its children.
pub(super) fn skip_subtree(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    part: &Part,
) -> Result<()> {
    reader
        .read_to_end_into(start.name(), &mut Vec::new())
        .map_err(|err| Error::xml(part.clone(), err))?;
    Ok(())
}

/// Returns the unescaped value of an attribute, matched by its local name.
pub(super) fn attr_value(start: &BytesStart<'_>, key: &[u8], part: &Part) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(|err| Error::xml(part.clone(), err))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| Error::xml(part.clone(), err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

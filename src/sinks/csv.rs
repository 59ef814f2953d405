use std::io::Write;
use std::sync::Mutex;

use csv::{ByteRecord, Writer, WriterBuilder};
use itoa::Buffer as ItoaBuffer;
use ryu::Buffer as RyuBuffer;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::SinkError;
use crate::record::{Field, FieldValue, SupplierRecord, ZERO_INSTANT};

use super::{BulkSink, poisoned};

const AUDIT_COLUMNS: [&str; 4] = ["id", "createdAt", "updatedAt", "deletedAt"];
const DEFAULT_SCRATCH_CAPACITY: usize = 64;

/// Writes records into a delimited text file (CSV/TSV).
///
/// The header row holds the audit columns followed by every field name in
/// column order. Absent values, zero dates and absent maps are empty cells.
pub struct CsvSink<W: Write + Send> {
    delimiter: u8,
    write_headers: bool,
    state: Mutex<CsvState<W>>,
}

struct CsvState<W: Write> {
    output: Option<W>,
    writer: Option<Writer<W>>,
    record: ByteRecord,
    scratch: Vec<u8>,
}

impl<W: Write + Send> CsvSink<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            delimiter: b',',
            write_headers: true,
            state: Mutex::new(CsvState {
                output: Some(writer),
                writer: None,
                record: ByteRecord::new(),
                scratch: Vec::with_capacity(DEFAULT_SCRATCH_CAPACITY),
            }),
        }
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub const fn with_headers(mut self, headers: bool) -> Self {
        self.write_headers = headers;
        self
    }

    /// Flushes the CSV writer and returns the underlying output.
    ///
    /// A sink that never received a batch still emits its header row.
    ///
    /// # Errors
    ///
    /// Returns an error if pending rows cannot be written.
    pub fn into_inner(self) -> Result<W, SinkError> {
        let (delimiter, write_headers) = (self.delimiter, self.write_headers);
        let mut state = self.state.into_inner().map_err(|_| poisoned("csv"))?;
        state.ensure_writer(delimiter, write_headers)?;
        let writer = state.writer.take().ok_or("csv writer already consumed")?;
        writer.into_inner().map_err(|err| err.into_error().into())
    }
}

impl<W: Write> CsvState<W> {
    fn ensure_writer(&mut self, delimiter: u8, write_headers: bool) -> Result<&mut Writer<W>, SinkError> {
        if self.writer.is_none() {
            let output = self.output.take().ok_or("csv sink output already taken")?;
            let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(output);
            if write_headers {
                let mut header = ByteRecord::new();
                for name in AUDIT_COLUMNS.into_iter().chain(Field::all().map(Field::name)) {
                    header.push_field(name.as_bytes());
                }
                writer.write_byte_record(&header)?;
            }
            self.writer = Some(writer);
        }
        self.writer.as_mut().ok_or_else(|| "csv writer unavailable".into())
    }
}

impl<W: Write + Send> BulkSink for CsvSink<W> {
    fn insert_many(&self, records: &[SupplierRecord]) -> Result<(), SinkError> {
        let mut state = self.state.lock().map_err(|_| poisoned("csv"))?;
        state.ensure_writer(self.delimiter, self.write_headers)?;
        let CsvState {
            writer,
            record,
            scratch,
            ..
        } = &mut *state;
        let writer = writer.as_mut().ok_or("csv writer unavailable")?;

        let mut ryu = RyuBuffer::new();
        let mut itoa = ItoaBuffer::new();
        for supplier in records {
            record.clear();
            record.push_field(supplier.audit.id.as_bytes());
            for instant in [Some(supplier.audit.created_at), Some(supplier.audit.updated_at), supplier.audit.deleted_at] {
                encode_date(instant, scratch)?;
                record.push_field(scratch.as_slice());
            }
            for field in Field::all() {
                encode_value(&supplier.value(field), scratch, &mut ryu, &mut itoa)?;
                record.push_field(scratch.as_slice());
            }
            writer.write_byte_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn encode_value(
    value: &FieldValue<'_>,
    out: &mut Vec<u8>,
    ryu: &mut RyuBuffer,
    itoa: &mut ItoaBuffer,
) -> Result<(), SinkError> {
    out.clear();
    match value {
        FieldValue::Text(text) | FieldValue::OptionalText(Some(text)) => {
            out.extend_from_slice(text.as_bytes());
        }
        FieldValue::OptionalText(None) | FieldValue::JsonMap(None) => {}
        FieldValue::Integer(number) => out.extend_from_slice(itoa.format(*number).as_bytes()),
        FieldValue::Decimal(number) => out.extend_from_slice(ryu.format(*number).as_bytes()),
        FieldValue::Date(instant) => encode_date(Some(*instant), out)?,
        FieldValue::JsonMap(Some(map)) => serde_json::to_writer(&mut *out, map)?,
    }
    Ok(())
}

fn encode_date(instant: Option<OffsetDateTime>, out: &mut Vec<u8>) -> Result<(), SinkError> {
    out.clear();
    match instant {
        Some(instant) if instant != ZERO_INSTANT => {
            instant.format_into(out, &Rfc3339)?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RawRow;
    use crate::record::build_record;

    fn read_back(bytes: Vec<u8>) -> Vec<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes.as_slice())
            .records()
            .collect::<Result<_, _>>()
            .expect("parse csv")
    }

    #[test]
    fn writes_header_and_typed_cells() {
        let sink = CsvSink::new(Vec::new());
        let row = RawRow::empty()
            .with(1, "Contoso")
            .with(Field::Quantity.column(), "2.5")
            .with(Field::MpnId.column(), "42")
            .with(Field::UsageDate.column(), "44197")
            .with(Field::Tags.column(), r#"{"env":"prod"}"#);
        sink.insert_many(&[build_record(&row)]).expect("insert");
        let rows = read_back(sink.into_inner().expect("finish"));

        assert_eq!(rows.len(), 2);
        let header = &rows[0];
        assert_eq!(header.len(), AUDIT_COLUMNS.len() + Field::all().count());
        assert_eq!(&header[0], "id");
        assert_eq!(&header[4], "partnerId");

        let data = &rows[1];
        let offset = AUDIT_COLUMNS.len();
        assert_eq!(&data[offset + Field::PartnerName.column()], "Contoso");
        assert_eq!(&data[offset + Field::Quantity.column()], "2.5");
        assert_eq!(&data[offset + Field::MpnId.column()], "42");
        assert_eq!(&data[offset + Field::UsageDate.column()], "2021-01-01T00:00:00Z");
        assert_eq!(&data[offset + Field::ChargeStartDate.column()], "");
        assert_eq!(&data[offset + Field::Tags.column()], r#"{"env":"prod"}"#);
        assert_eq!(&data[offset + Field::PublisherId.column()], "");
        assert_eq!(&data[3], "");
    }

    #[test]
    fn tab_delimited_without_header() {
        let sink = CsvSink::new(Vec::new()).with_delimiter(b'\t').with_headers(false);
        sink.insert_many(&[build_record(&RawRow::empty())]).expect("insert");
        let text = String::from_utf8(sink.into_inner().expect("finish")).expect("utf8");
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains('\t'));
        assert!(!text.contains("partnerId"));
    }

    #[test]
    fn unused_sink_still_writes_header() {
        let sink = CsvSink::new(Vec::new());
        let text = String::from_utf8(sink.into_inner().expect("finish")).expect("utf8");
        assert!(text.starts_with("id,createdAt,updatedAt,deletedAt,partnerId,"));
    }
}

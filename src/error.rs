use std::borrow::Cow;
use std::fmt;
use std::io;

use crate::record::ValidationError;

/// Result type used across the spreadsheet ingestion pipeline.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed failure reported by a bulk-insert sink.
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// High-level error type surfaced by an import.
///
/// Exactly one of these is returned per failed import, regardless of how many
/// workers observed a failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure while reading from the underlying byte source.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The byte source is not a readable zip container, or a part could not be inflated.
    #[error("cannot open spreadsheet archive: {details}")]
    Archive { details: Cow<'static, str> },

    /// No part matching the worksheet naming convention exists in the archive.
    #[error("worksheet not found in spreadsheet archive")]
    WorksheetMissing,

    /// A part contained XML that could not be decoded.
    #[error("malformed XML in {part}: {details}")]
    Xml {
        part: Part,
        details: Cow<'static, str>,
    },

    /// The worksheet holds no data beyond its header row.
    #[error("empty sheet: the worksheet has no data rows")]
    EmptySheet,

    /// A mapped record violated a declarative validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The bulk-insert sink rejected a batch.
    #[error("import error: {source}")]
    Sink {
        #[source]
        source: SinkError,
    },

    /// The job was cancelled by its owner before any other failure was recorded.
    #[error("import cancelled")]
    Cancelled,
}

/// Coarse classification of an [`Error`], used by callers to decide how to
/// report a failure without inspecting concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised before any concurrent work started (archive, XML, empty sheet).
    Setup,
    /// Raised while mapping or validating a single row.
    Record,
    /// Raised by the sink, or by the job's own coordination.
    Sink,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_)
            | Self::Archive { .. }
            | Self::WorksheetMissing
            | Self::Xml { .. }
            | Self::EmptySheet => ErrorKind::Setup,
            Self::Validation(_) => ErrorKind::Record,
            Self::Sink { .. } | Self::Cancelled => ErrorKind::Sink,
        }
    }

    pub(crate) fn xml(part: Part, err: impl fmt::Display) -> Self {
        Self::Xml {
            part,
            details: Cow::Owned(err.to_string()),
        }
    }

    pub(crate) fn sink(source: SinkError) -> Self {
        Self::Sink { source }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => Self::Io(io),
            other => Self::Archive {
                details: Cow::Owned(other.to_string()),
            },
        }
    }
}

/// Archive part an XML error was raised from, used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    SharedStrings,
    Worksheet { name: String, row: Option<u64> },
}

impl Part {
    #[must_use]
    pub fn worksheet(name: impl Into<String>) -> Self {
        Self::Worksheet {
            name: name.into(),
            row: None,
        }
    }

    #[must_use]
    pub fn at_row(self, index: u64) -> Self {
        match self {
            Self::Worksheet { name, .. } => Self::Worksheet {
                name,
                row: Some(index),
            },
            other @ Self::SharedStrings => other,
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedStrings => write!(f, "shared strings"),
            Self::Worksheet { name, row: None } => write!(f, "worksheet {name}"),
            Self::Worksheet {
                name,
                row: Some(row),
            } => write!(f, "worksheet {name} (row {row})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, Rule};

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::EmptySheet.kind(), ErrorKind::Setup);
        assert_eq!(Error::WorksheetMissing.kind(), ErrorKind::Setup);
        let validation = ValidationError::new(Field::PartnerName, Rule::Required);
        assert_eq!(Error::from(validation).kind(), ErrorKind::Record);
        let sink = Error::sink("disk full".into());
        assert_eq!(sink.kind(), ErrorKind::Sink);
        assert_eq!(sink.to_string(), "import error: disk full");
    }

    #[test]
    fn part_display_mentions_row() {
        let part = Part::worksheet("xl/worksheets/sheet1.xml").at_row(7);
        assert_eq!(part.to_string(), "worksheet xl/worksheets/sheet1.xml (row 7)");
        assert_eq!(Part::SharedStrings.at_row(3), Part::SharedStrings);
    }
}

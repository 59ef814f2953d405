use std::borrow::Cow;
use std::io::{Read, Seek};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::logger::log_warn;

use super::shared_strings::{SharedStringTable, parse_shared_strings};

/// Fixed location of the workbook's shared-string table.
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
/// Prefix every worksheet part name starts with.
pub const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";

/// Upper bound on the inflated size of any single part held in memory.
const MAX_PART_BYTES: u64 = 512 * 1024 * 1024;

/// Raw XML of the worksheet selected for import.
#[derive(Debug, Clone)]
pub struct WorksheetPart {
    pub name: String,
    pub xml: Vec<u8>,
}

/// Zip container holding the workbook parts.
pub struct Workbook<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Workbook<R> {
    /// Opens the container from a random-access byte source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Archive`] if the source is not a readable zip archive.
    pub fn open(source: R) -> Result<Self> {
        let archive = ZipArchive::new(source).map_err(|err| Error::Archive {
            details: Cow::Owned(err.to_string()),
        })?;
        Ok(Self { archive })
    }

    /// Name of the worksheet part to import, if any.
    ///
    /// When several parts match the naming convention, the lowest sheet
    /// number wins (`sheet2.xml` before `sheet10.xml`).
    #[must_use]
    pub fn worksheet_part_name(&self) -> Option<String> {
        self.archive
            .file_names()
            .filter(|name| is_worksheet_part(name))
            .min_by(|a, b| {
                sheet_number(a)
                    .cmp(&sheet_number(b))
                    .then_with(|| a.cmp(b))
            })
            .map(str::to_owned)
    }

    /// Loads the shared-string table, or an empty table when the part is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the part cannot be inflated or holds malformed XML.
    pub fn shared_strings(&mut self) -> Result<SharedStringTable> {
        match self.read_part_optional(SHARED_STRINGS_PART)? {
            Some(bytes) => parse_shared_strings(&bytes),
            None => Ok(SharedStringTable::default()),
        }
    }

    /// Loads the worksheet part selected by [`Self::worksheet_part_name`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorksheetMissing`] if no worksheet part exists, or an
    /// archive error if it cannot be inflated.
    pub fn worksheet(&mut self) -> Result<WorksheetPart> {
        let name = self.worksheet_part_name().ok_or(Error::WorksheetMissing)?;
        let candidates = self
            .archive
            .file_names()
            .filter(|part| is_worksheet_part(part))
            .count();
        if candidates > 1 {
            log_warn(&format!(
                "workbook has {candidates} worksheets; only {name} is imported"
            ));
        }
        let xml = self
            .read_part_optional(&name)?
            .ok_or(Error::WorksheetMissing)?;
        Ok(WorksheetPart { name, xml })
    }

    /// Reads a part fully into memory, returning `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the part is corrupt or exceeds the size guard.
    pub fn read_part_optional(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let declared = file.size();
        if declared > MAX_PART_BYTES {
            return Err(Error::Archive {
                details: Cow::Owned(format!(
                    "part {name} declares {declared} bytes, above the {MAX_PART_BYTES} byte limit"
                )),
            });
        }
        let mut buf = Vec::with_capacity(usize::try_from(declared).unwrap_or(0));
        // The declared size can be forged, so cap the actual read as well.
        file.take(MAX_PART_BYTES + 1).read_to_end(&mut buf)?;
        if buf.len() as u64 > MAX_PART_BYTES {
            return Err(Error::Archive {
                details: Cow::Owned(format!("part {name} inflates past the size limit")),
            });
        }
        Ok(Some(buf))
    }
}

fn is_worksheet_part(name: &str) -> bool {
    name.starts_with(WORKSHEET_PREFIX)
        && !name[WORKSHEET_PREFIX.len()..].contains('/')
        && name.ends_with(".xml")
}

fn sheet_number(name: &str) -> u32 {
    name.strip_prefix(WORKSHEET_PREFIX)
        .and_then(|rest| rest.strip_suffix(".xml"))
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(u32::MAX)
}

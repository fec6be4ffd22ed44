//! Records stored in the `DSDB` B-tree.

use std::borrow::Cow;

use super::buddy::Block;
use super::error::FormatError;

/// Typed payload of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    /// `bool`: one byte.
    Bool(bool),
    /// `long`: 32-bit big-endian integer.
    Long(u32),
    /// `shor`: 16-bit integer padded to four bytes.
    Short(u16),
    /// `type`: a four-character code.
    Type([u8; 4]),
    /// `comp`: 64-bit integer.
    Comp(u64),
    /// `dutc`: 64-bit timestamp (1/65536 s since 1904).
    Dutc(u64),
    /// `blob`: length-prefixed opaque bytes.
    Blob(Vec<u8>),
    /// `ustr`: length-prefixed UTF-16BE string.
    Ustr(String),
}

/// One `(filename, structure code, value)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Name of the directory entry the record describes.
    pub filename: String,
    /// Four-character structure code such as `Iloc` or `cmmt`.
    pub code: [u8; 4],
    /// Decoded value.
    pub value: RecordValue,
}

impl Record {
    /// Returns the structure code as text.
    #[must_use]
    pub fn code_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.code)
    }

    pub(crate) fn read(block: &mut Block<'_>) -> Result<Self, FormatError> {
        let name_units = block.read_u32()?;
        let filename = block.read_utf16(name_units)?;
        let code = block.read_array::<4>()?;
        let type_code = block.read_array::<4>()?;

        let value = match &type_code {
            b"bool" => RecordValue::Bool(block.read_u8()? != 0),
            b"long" => RecordValue::Long(block.read_u32()?),
            b"shor" => {
                block.read_bytes(2)?;
                RecordValue::Short(block.read_u16()?)
            }
            b"type" => RecordValue::Type(block.read_array::<4>()?),
            b"comp" => RecordValue::Comp(block.read_u64()?),
            b"dutc" => RecordValue::Dutc(block.read_u64()?),
            b"blob" => {
                let len = block.read_u32()?;
                let len = usize::try_from(len).unwrap_or(usize::MAX);
                RecordValue::Blob(block.read_bytes(len)?.to_vec())
            }
            b"ustr" => {
                let units = block.read_u32()?;
                RecordValue::Ustr(block.read_utf16(units)?)
            }
            other => {
                return Err(FormatError::UnknownType {
                    code: String::from_utf8_lossy(other).into_owned(),
                });
            }
        };

        Ok(Self {
            filename,
            code,
            value,
        })
    }
}

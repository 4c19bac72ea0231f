//! Doc-values formats: the capability resolved through the format registry.
//!
//! A doc-values block is the column-oriented value store of one field in one
//! segment. Every format implements [`DocValuesFormat`]; segment files record
//! the registry name a field was written with so the reader can resolve the
//! exact same format later.
//!
//! Every block produced by the built-in formats shares one frame:
//!
//! ```text
//! magic (4) | version (1) | payload length (u64 LE) | payload | crc32 (u32 LE)
//! ```

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

pub mod packed;
pub mod plain;
pub mod serialized;
pub mod varint;

pub use packed::VarIntDocValuesFormat;
pub use plain::PlainDocValuesFormat;
pub use serialized::BincodeDocValuesFormat;

/// A single per-document value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Binary(Vec<u8>),
}

/// Largest doc id a column accepts; a segment holds at most `i32::MAX` documents.
pub const MAX_DOC_ID: u64 = i32::MAX as u64 - 1;

/// DocValues of a single field: doc id → value, `None` for missing values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldDocValues {
    /// Field name
    pub field_name: String,
    values: Vec<Option<DocValue>>,
}

impl FieldDocValues {
    /// Create an empty column for a field.
    pub fn new<S: Into<String>>(field_name: S) -> Self {
        FieldDocValues {
            field_name: field_name.into(),
            values: Vec::new(),
        }
    }

    /// Create a column from already laid out values.
    pub fn from_values<S: Into<String>>(field_name: S, values: Vec<Option<DocValue>>) -> Self {
        FieldDocValues {
            field_name: field_name.into(),
            values,
        }
    }

    /// Set a value for a document, growing the column as needed.
    ///
    /// Doc ids above [`MAX_DOC_ID`] are rejected.
    pub fn set(&mut self, doc_id: u64, value: DocValue) -> Result<()> {
        if doc_id > MAX_DOC_ID {
            return Err(StrataError::codec(format!(
                "Doc id {doc_id} exceeds maximum {MAX_DOC_ID}"
            )));
        }
        let slot = usize::try_from(doc_id)
            .map_err(|_| StrataError::codec(format!("Doc id {doc_id} does not fit in memory")))?;
        if slot >= self.values.len() {
            self.values.resize(slot + 1, None);
        }
        self.values[slot] = Some(value);
        Ok(())
    }

    /// Get a value for a document
    pub fn get(&self, doc_id: u64) -> Option<&DocValue> {
        self.values.get(doc_id as usize).and_then(Option::as_ref)
    }

    /// Number of slots (highest doc id + 1).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All slots, including missing ones.
    pub fn values(&self) -> &[Option<DocValue>] {
        &self.values
    }

    /// Present values with their doc ids.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &DocValue)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(doc_id, value)| value.as_ref().map(|v| (doc_id as u64, v)))
    }
}

/// Encoder/decoder for one field's doc-values block.
///
/// Implementations must be cheap to construct and must not touch index I/O
/// while being constructed; the registry builds at most one instance per
/// registered descriptor and shares it across threads.
pub trait DocValuesFormat: Send + Sync + std::fmt::Debug {
    /// Canonical name of this format.
    fn name(&self) -> &str;

    /// Write one field's values as a self-delimiting block.
    fn write_field(&self, field: &FieldDocValues, output: &mut dyn Write) -> Result<()>;

    /// Read one block previously written by [`DocValuesFormat::write_field`].
    fn read_field(&self, input: &mut dyn Read) -> Result<FieldDocValues>;
}

const TAG_MISSING: u8 = 0;
const TAG_INTEGER: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_BOOLEAN: u8 = 3;
const TAG_TEXT: u8 = 4;
const TAG_BINARY: u8 = 5;

/// Frame a payload with magic, version, length and checksum.
pub(crate) fn write_block(
    output: &mut dyn Write,
    magic: &[u8; 4],
    version: u8,
    payload: &[u8],
) -> Result<()> {
    output.write_all(magic)?;
    output.write_u8(version)?;
    output.write_u64::<LittleEndian>(payload.len() as u64)?;
    output.write_all(payload)?;
    output.write_u32::<LittleEndian>(crc32fast::hash(payload))?;
    Ok(())
}

/// Read a framed payload, verifying magic, version and checksum.
pub(crate) fn read_block(
    input: &mut dyn Read,
    magic: &[u8; 4],
    max_version: u8,
) -> Result<Vec<u8>> {
    let mut found = [0u8; 4];
    input.read_exact(&mut found)?;
    if &found != magic {
        return Err(StrataError::codec(format!(
            "Invalid block magic: expected {:?}, found {:?}",
            String::from_utf8_lossy(magic),
            String::from_utf8_lossy(&found)
        )));
    }

    let version = input.read_u8()?;
    if version == 0 || version > max_version {
        return Err(StrataError::codec(format!(
            "Unsupported block version {version} (max {max_version})"
        )));
    }

    let len = input.read_u64::<LittleEndian>()?;
    let mut payload = Vec::new();
    (&mut *input).take(len).read_to_end(&mut payload)?;
    if payload.len() as u64 != len {
        return Err(StrataError::codec(format!(
            "Truncated block: expected {len} bytes, found {}",
            payload.len()
        )));
    }

    let checksum = input.read_u32::<LittleEndian>()?;
    let actual = crc32fast::hash(&payload);
    if checksum != actual {
        return Err(StrataError::codec(format!(
            "Checksum mismatch: stored {checksum:#010x}, computed {actual:#010x}"
        )));
    }

    Ok(payload)
}

/// How integers and lengths are laid out inside a tagged payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntLayout {
    Fixed,
    VarInt,
}

impl IntLayout {
    fn write_len(self, buf: &mut Vec<u8>, len: usize) -> Result<()> {
        match self {
            IntLayout::Fixed => buf.write_u64::<LittleEndian>(len as u64)?,
            IntLayout::VarInt => {
                varint::write_u64(buf, len as u64)?;
            }
        }
        Ok(())
    }

    fn read_len(self, cursor: &mut Cursor<&[u8]>) -> Result<usize> {
        let len = match self {
            IntLayout::Fixed => cursor.read_u64::<LittleEndian>()?,
            IntLayout::VarInt => varint::read_u64(cursor)?,
        };
        let remaining = cursor.get_ref().len() as u64 - cursor.position();
        if len > remaining {
            return Err(StrataError::codec(format!(
                "Length {len} exceeds remaining {remaining} bytes"
            )));
        }
        Ok(len as usize)
    }

    fn write_int(self, buf: &mut Vec<u8>, value: i64) -> Result<()> {
        match self {
            IntLayout::Fixed => buf.write_i64::<LittleEndian>(value)?,
            IntLayout::VarInt => {
                varint::write_u64(buf, varint::zigzag_encode(value))?;
            }
        }
        Ok(())
    }

    fn read_int(self, cursor: &mut Cursor<&[u8]>) -> Result<i64> {
        match self {
            IntLayout::Fixed => Ok(cursor.read_i64::<LittleEndian>()?),
            IntLayout::VarInt => Ok(varint::zigzag_decode(varint::read_u64(cursor)?)),
        }
    }

    fn read_bytes(self, cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
        let len = self.read_len(cursor)?;
        let mut bytes = vec![0u8; len];
        cursor.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

/// Encode a column as `field name | slot count | tagged slots`.
pub(crate) fn encode_tagged(field: &FieldDocValues, layout: IntLayout) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    layout.write_len(&mut buf, field.field_name.len())?;
    buf.extend_from_slice(field.field_name.as_bytes());
    layout.write_len(&mut buf, field.values.len())?;

    for slot in &field.values {
        match slot {
            None => buf.push(TAG_MISSING),
            Some(DocValue::Integer(v)) => {
                buf.push(TAG_INTEGER);
                layout.write_int(&mut buf, *v)?;
            }
            Some(DocValue::Float(v)) => {
                buf.push(TAG_FLOAT);
                buf.write_f64::<LittleEndian>(*v)?;
            }
            Some(DocValue::Boolean(v)) => {
                buf.push(TAG_BOOLEAN);
                buf.push(u8::from(*v));
            }
            Some(DocValue::Text(v)) => {
                buf.push(TAG_TEXT);
                layout.write_len(&mut buf, v.len())?;
                buf.extend_from_slice(v.as_bytes());
            }
            Some(DocValue::Binary(v)) => {
                buf.push(TAG_BINARY);
                layout.write_len(&mut buf, v.len())?;
                buf.extend_from_slice(v);
            }
        }
    }

    Ok(buf)
}

/// Inverse of [`encode_tagged`]. The payload must be consumed exactly.
pub(crate) fn decode_tagged(payload: &[u8], layout: IntLayout) -> Result<FieldDocValues> {
    let mut cursor = Cursor::new(payload);

    let field_name = String::from_utf8(layout.read_bytes(&mut cursor)?)
        .map_err(|e| StrataError::codec(format!("Invalid field name: {e}")))?;

    // Every slot takes at least one byte, which bounds the allocation.
    let slots = layout.read_len(&mut cursor)?;
    let mut values = Vec::with_capacity(slots);

    for _ in 0..slots {
        let value = match cursor.read_u8()? {
            TAG_MISSING => None,
            TAG_INTEGER => Some(DocValue::Integer(layout.read_int(&mut cursor)?)),
            TAG_FLOAT => Some(DocValue::Float(cursor.read_f64::<LittleEndian>()?)),
            TAG_BOOLEAN => Some(DocValue::Boolean(cursor.read_u8()? != 0)),
            TAG_TEXT => {
                let text = String::from_utf8(layout.read_bytes(&mut cursor)?)
                    .map_err(|e| StrataError::codec(format!("Invalid text value: {e}")))?;
                Some(DocValue::Text(text))
            }
            TAG_BINARY => Some(DocValue::Binary(layout.read_bytes(&mut cursor)?)),
            tag => return Err(StrataError::codec(format!("Unknown value tag: {tag}"))),
        };
        values.push(value);
    }

    if cursor.position() != payload.len() as u64 {
        return Err(StrataError::codec(format!(
            "Trailing bytes in block for field '{field_name}'"
        )));
    }

    Ok(FieldDocValues { field_name, values })
}

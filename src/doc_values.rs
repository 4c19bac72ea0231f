//! Segment doc-values files.
//!
//! A `.dv` file holds the doc-values columns of one segment. Each field is
//! written by a format resolved from the [`DocValuesFormatFactory`] and the
//! file records that format's registry name next to the field, so a reader
//! decodes every column with the format that produced it:
//!
//! ```text
//! "DVFF" | version (2) | field count (u32)
//! per field: name (u32 len + utf8) | format name (u32 len + utf8) | format block
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use ahash::AHashMap;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::codec::{DocValue, DocValuesFormat, FieldDocValues};
use crate::error::{Result, StrataError};
use crate::format::DocValuesFormatFactory;
use crate::storage::Storage;

/// DocValues file extension
const DOC_VALUES_EXTENSION: &str = ".dv";

const MAGIC: &[u8; 4] = b"DVFF";
const VERSION: [u8; 2] = [2, 0];

/// Name of the doc-values file of a segment.
pub fn doc_values_file_name(segment_name: &str) -> String {
    format!("{segment_name}{DOC_VALUES_EXTENSION}")
}

fn write_len(buf: &mut Vec<u8>, len: usize, what: &str) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| StrataError::codec(format!("{what} {len} does not fit in 32 bits")))?;
    buf.write_u32::<LittleEndian>(len)?;
    Ok(())
}

fn write_string(buf: &mut Vec<u8>, value: &str, what: &str) -> Result<()> {
    write_len(buf, value.len(), what)?;
    buf.write_all(value.as_bytes())?;
    Ok(())
}

fn read_string(input: &mut &[u8], what: &str) -> Result<String> {
    let len = input.read_u32::<LittleEndian>()? as usize;
    if len > input.len() {
        return Err(StrataError::codec(format!(
            "{what} length {len} exceeds remaining {} bytes",
            input.len()
        )));
    }
    let (bytes, rest) = input.split_at(len);
    *input = rest;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| StrataError::codec(format!("Invalid {what}: {e}")))
}

/// Writer for DocValues
pub struct DocValuesWriter {
    storage: Arc<dyn Storage>,
    formats: Arc<DocValuesFormatFactory>,
    segment_name: String,
    default_format: String,
    field_formats: AHashMap<String, String>,
    fields: BTreeMap<String, FieldDocValues>,
}

impl DocValuesWriter {
    /// Create a writer that encodes every field with `default_format` unless
    /// overridden per field.
    pub fn new(
        storage: Arc<dyn Storage>,
        formats: Arc<DocValuesFormatFactory>,
        segment_name: impl Into<String>,
        default_format: impl Into<String>,
    ) -> Result<Self> {
        let default_format = default_format.into();
        if !formats.contains(&default_format) {
            return Err(StrataError::not_found(default_format));
        }

        Ok(DocValuesWriter {
            storage,
            formats,
            segment_name: segment_name.into(),
            default_format,
            field_formats: AHashMap::new(),
            fields: BTreeMap::new(),
        })
    }

    /// Encode `field_name` with `format_name` instead of the default.
    pub fn set_field_format(&mut self, field_name: &str, format_name: &str) -> Result<()> {
        if !self.formats.contains(format_name) {
            return Err(StrataError::not_found(format_name));
        }
        self.field_formats
            .insert(field_name.to_string(), format_name.to_string());
        Ok(())
    }

    /// Format name a field will be written with.
    pub fn field_format(&self, field_name: &str) -> &str {
        self.field_formats
            .get(field_name)
            .map(String::as_str)
            .unwrap_or(&self.default_format)
    }

    /// Add a field value for a document
    pub fn add_value(&mut self, doc_id: u64, field_name: &str, value: DocValue) -> Result<()> {
        self.fields
            .entry(field_name.to_string())
            .or_insert_with(|| FieldDocValues::new(field_name))
            .set(doc_id, value)
    }

    /// Add a whole column, replacing any values collected for that field.
    pub fn add_field(&mut self, field: FieldDocValues) {
        self.fields.insert(field.field_name.clone(), field);
    }

    /// Write the segment's doc-values file.
    ///
    /// All formats are resolved before anything is written, so a resolution
    /// failure leaves no partial file behind.
    pub fn write(&self) -> Result<()> {
        let mut resolved: Vec<(&FieldDocValues, &str, Arc<dyn DocValuesFormat>)> =
            Vec::with_capacity(self.fields.len());
        for field in self.fields.values() {
            let format_name = self.field_format(&field.field_name);
            resolved.push((
                field,
                format_name,
                self.formats.resolve_by_name(format_name)?,
            ));
        }

        let mut buf = Vec::new();
        buf.write_all(MAGIC)?;
        buf.write_all(&VERSION)?;
        write_len(&mut buf, resolved.len(), "field count")?;

        for (field, format_name, format) in &resolved {
            write_string(&mut buf, &field.field_name, "field name length")?;
            write_string(&mut buf, format_name, "format name length")?;
            format.write_field(field, &mut buf)?;
        }

        let file_name = doc_values_file_name(&self.segment_name);
        let mut output = self.storage.create_output(&file_name)?;
        output.write_all(&buf)?;
        output.flush()?;
        output.close()?;

        debug!(
            segment = %self.segment_name,
            fields = resolved.len(),
            bytes = buf.len(),
            "wrote doc values"
        );
        Ok(())
    }
}

/// Reader for DocValues
#[derive(Debug, Default)]
pub struct DocValuesReader {
    fields: AHashMap<String, FieldDocValues>,
    formats: AHashMap<String, String>,
}

impl DocValuesReader {
    /// Load a segment's doc-values, decoding each field with the format
    /// recorded for it.
    ///
    /// A segment without a doc-values file yields an empty reader. A recorded
    /// format name the factory does not know fails with `NotFound`.
    pub fn load(
        storage: Arc<dyn Storage>,
        segment_name: &str,
        formats: &DocValuesFormatFactory,
    ) -> Result<Self> {
        let file_name = doc_values_file_name(segment_name);
        if !storage.file_exists(&file_name) {
            return Ok(DocValuesReader::default());
        }

        let mut data = Vec::new();
        storage.open_input(&file_name)?.read_to_end(&mut data)?;
        let mut input = data.as_slice();

        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(StrataError::codec("Invalid DocValues file format"));
        }

        let mut version = [0u8; 2];
        input.read_exact(&mut version)?;
        if version[0] != VERSION[0] {
            return Err(StrataError::codec(format!(
                "Unsupported DocValues version: {}.{}",
                version[0], version[1]
            )));
        }

        let num_fields = input.read_u32::<LittleEndian>()?;
        let mut reader = DocValuesReader::default();

        for _ in 0..num_fields {
            let field_name = read_string(&mut input, "field name")?;
            let format_name = read_string(&mut input, "format name")?;

            let format = formats.resolve_by_name(&format_name)?;
            let field = format.read_field(&mut input)?;
            if field.field_name != field_name {
                return Err(StrataError::codec(format!(
                    "Field '{field_name}' decoded as '{}' by format '{format_name}'",
                    field.field_name
                )));
            }

            reader.formats.insert(field_name.clone(), format_name);
            reader.fields.insert(field_name, field);
        }

        if !input.is_empty() {
            return Err(StrataError::codec(format!(
                "{} trailing bytes in {file_name}",
                input.len()
            )));
        }

        Ok(reader)
    }

    /// Get DocValues for a field
    pub fn get_field(&self, field_name: &str) -> Option<&FieldDocValues> {
        self.fields.get(field_name)
    }

    /// Get a value for a document and field
    pub fn get_value(&self, field_name: &str, doc_id: u64) -> Option<&DocValue> {
        self.fields.get(field_name).and_then(|dv| dv.get(doc_id))
    }

    /// Check if a field has DocValues
    pub fn has_field(&self, field_name: &str) -> bool {
        self.fields.contains_key(field_name)
    }

    /// Format name recorded for a field.
    pub fn format_name(&self, field_name: &str) -> Option<&str> {
        self.formats.get(field_name).map(String::as_str)
    }

    /// Get all field names with DocValues, sorted.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    fn setup() -> (Arc<dyn Storage>, Arc<DocValuesFormatFactory>) {
        let storage: Arc<dyn Storage> =
            Arc::new(MemoryStorage::new(MemoryStorageConfig::default()));
        let formats = Arc::new(DocValuesFormatFactory::with_builtins().unwrap());
        (storage, formats)
    }

    #[test]
    fn test_doc_values_write_read() {
        let (storage, formats) = setup();
        let segment_name = "segment_0";

        {
            let mut writer =
                DocValuesWriter::new(storage.clone(), formats.clone(), segment_name, "Plain")
                    .unwrap();
            writer.set_field_format("rating", "Bincode").unwrap();
            writer
                .add_value(0, "year", DocValue::Integer(2023))
                .unwrap();
            writer
                .add_value(1, "year", DocValue::Integer(2024))
                .unwrap();
            writer.add_value(0, "rating", DocValue::Float(4.5)).unwrap();
            writer.add_value(1, "rating", DocValue::Float(5.0)).unwrap();
            writer.write().unwrap();
        }

        let reader = DocValuesReader::load(storage.clone(), segment_name, &formats).unwrap();
        assert!(reader.has_field("year"));
        assert!(reader.has_field("rating"));
        assert!(!reader.has_field("unknown"));
        assert_eq!(reader.field_names(), vec!["rating", "year"]);

        assert_eq!(reader.get_value("year", 0), Some(&DocValue::Integer(2023)));
        assert_eq!(reader.get_value("year", 1), Some(&DocValue::Integer(2024)));
        assert_eq!(reader.get_value("rating", 0), Some(&DocValue::Float(4.5)));
        assert_eq!(reader.get_value("rating", 1), Some(&DocValue::Float(5.0)));

        assert_eq!(reader.format_name("year"), Some("Plain"));
        assert_eq!(reader.format_name("rating"), Some("Bincode"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (storage, formats) = setup();
        let reader = DocValuesReader::load(storage, "segment_9", &formats).unwrap();
        assert!(reader.field_names().is_empty());
    }

    #[test]
    fn test_unknown_default_format() {
        let (storage, formats) = setup();
        let err = DocValuesWriter::new(storage, formats, "segment_0", "Lucene45")
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_field_format() {
        let (storage, formats) = setup();
        let mut writer = DocValuesWriter::new(storage, formats, "segment_0", "VarInt").unwrap();
        let err = writer.set_field_format("year", "Nope").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(writer.field_format("year"), "VarInt");
    }

    #[test]
    fn test_corrupt_header() {
        let (storage, formats) = setup();
        {
            let mut output = storage.create_output("segment_0.dv").unwrap();
            output.write_all(b"NOPE\x02\x00").unwrap();
            output.close().unwrap();
        }
        let err = DocValuesReader::load(storage, "segment_0", &formats).unwrap_err();
        assert!(err.to_string().contains("Invalid DocValues file format"));
    }

    #[test]
    fn test_add_value_rejects_out_of_range_doc_id() {
        let (storage, formats) = setup();
        let mut writer = DocValuesWriter::new(storage, formats, "segment_0", "Plain").unwrap();

        let err = writer
            .add_value(u64::MAX, "year", DocValue::Integer(1))
            .unwrap_err();
        assert!(matches!(err, StrataError::Codec(_)));
        writer.add_value(1, "year", DocValue::Integer(2)).unwrap();
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_length_over_u32_is_rejected() {
        let mut buf = Vec::new();
        let err = write_len(&mut buf, u32::MAX as usize + 1, "field count").unwrap_err();
        assert!(err.to_string().contains("field count 4294967296"));
        assert!(buf.is_empty());

        write_len(&mut buf, 3, "field count").unwrap();
        assert_eq!(buf, 3u32.to_le_bytes());
    }
}

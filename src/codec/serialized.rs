//! Serde-backed doc-values format.

use std::io::{Read, Write};

use crate::codec::{DocValue, DocValuesFormat, FieldDocValues, read_block, write_block};
use crate::error::{Result, StrataError};

const MAGIC: &[u8; 4] = b"DVBC";
const VERSION: u8 = 1;

/// Stores `(field name, slots)` serialized with bincode. Registered as `Bincode`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeDocValuesFormat;

impl DocValuesFormat for BincodeDocValuesFormat {
    fn name(&self) -> &str {
        "Bincode"
    }

    fn write_field(&self, field: &FieldDocValues, output: &mut dyn Write) -> Result<()> {
        let payload = bincode::serialize(&(&field.field_name, field.values()))
            .map_err(|e| StrataError::codec(format!("Failed to serialize DocValues: {e}")))?;
        write_block(output, MAGIC, VERSION, &payload)
    }

    fn read_field(&self, input: &mut dyn Read) -> Result<FieldDocValues> {
        let payload = read_block(input, MAGIC, VERSION)?;
        let (field_name, values): (String, Vec<Option<DocValue>>) = bincode::deserialize(&payload)
            .map_err(|e| StrataError::codec(format!("Failed to deserialize DocValues: {e}")))?;
        Ok(FieldDocValues::from_values(field_name, values))
    }
}

crate::register_doc_values_format!(BincodeDocValuesFormat);

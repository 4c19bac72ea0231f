//! Fixed-width doc-values format.

use std::io::{Read, Write};

use crate::codec::{
    DocValuesFormat, FieldDocValues, IntLayout, decode_tagged, encode_tagged, read_block,
    write_block,
};
use crate::error::Result;

const MAGIC: &[u8; 4] = b"DVPL";
const VERSION: u8 = 1;

/// Little-endian fixed-width layout: every integer and length takes 8 bytes.
///
/// Registered as `Plain`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainDocValuesFormat;

impl DocValuesFormat for PlainDocValuesFormat {
    fn name(&self) -> &str {
        "Plain"
    }

    fn write_field(&self, field: &FieldDocValues, output: &mut dyn Write) -> Result<()> {
        let payload = encode_tagged(field, IntLayout::Fixed)?;
        write_block(output, MAGIC, VERSION, &payload)
    }

    fn read_field(&self, input: &mut dyn Read) -> Result<FieldDocValues> {
        let payload = read_block(input, MAGIC, VERSION)?;
        decode_tagged(&payload, IntLayout::Fixed)
    }
}

crate::register_doc_values_format!(PlainDocValuesFormat);

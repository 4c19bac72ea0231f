//! Varint-packed doc-values format.

use std::io::{Read, Write};

use crate::codec::{
    DocValuesFormat, FieldDocValues, IntLayout, decode_tagged, encode_tagged, read_block,
    write_block,
};
use crate::error::Result;

const MAGIC: &[u8; 4] = b"DVVI";
const VERSION: u8 = 1;

/// Same tagged layout as `Plain`, but integers are zig-zag varints and
/// lengths are varints. Registered as `VarInt`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VarIntDocValuesFormat;

impl DocValuesFormat for VarIntDocValuesFormat {
    fn name(&self) -> &str {
        "VarInt"
    }

    fn write_field(&self, field: &FieldDocValues, output: &mut dyn Write) -> Result<()> {
        let payload = encode_tagged(field, IntLayout::VarInt)?;
        write_block(output, MAGIC, VERSION, &payload)
    }

    fn read_field(&self, input: &mut dyn Read) -> Result<FieldDocValues> {
        let payload = read_block(input, MAGIC, VERSION)?;
        decode_tagged(&payload, IntLayout::VarInt)
    }
}

crate::register_doc_values_format!(VarIntDocValuesFormat);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DocValue, PlainDocValuesFormat};

    fn small_ints() -> FieldDocValues {
        let mut field = FieldDocValues::new("rank");
        for doc_id in 0..100 {
            field
                .set(doc_id, DocValue::Integer(doc_id as i64 - 50))
                .unwrap();
        }
        field
    }

    #[test]
    fn test_write_read_field() {
        let mut field = small_ints();
        field.set(120, DocValue::Text("tail".to_string())).unwrap();
        field.set(121, DocValue::Boolean(false)).unwrap();

        let mut bytes = Vec::new();
        VarIntDocValuesFormat
            .write_field(&field, &mut bytes)
            .unwrap();

        let decoded = VarIntDocValuesFormat
            .read_field(&mut bytes.as_slice())
            .unwrap();
        assert_eq!(decoded, field);
    }

    #[test]
    fn test_smaller_than_plain_for_small_ints() {
        let field = small_ints();

        let mut packed = Vec::new();
        VarIntDocValuesFormat
            .write_field(&field, &mut packed)
            .unwrap();
        let mut plain = Vec::new();
        PlainDocValuesFormat
            .write_field(&field, &mut plain)
            .unwrap();

        assert!(packed.len() * 3 < plain.len());
    }
}

//! Data Record (§3, §4.4): an ordered sequence of field values matching a
//! template, with `paddingOctets` synthesis on write and discard on read.

use crate::error::CodecResult;
use crate::field_specifier::FieldSpecifier;
use crate::field_value::{self, FieldData, FieldValue};
use crate::codec::Value;
use crate::structured::StructuredContext;
use crate::template::TemplateRecord;

/// Name of the synthesized padding IE, per §3: "If a template declares a
/// field named `paddingOctets`...".
const PADDING_OCTETS_NAME: &str = "paddingOctets";

#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    pub template_id: u16,
    pub fields: Vec<FieldValue>,
}

impl DataRecord {
    pub fn new(template_id: u16, fields: Vec<FieldValue>) -> Self {
        DataRecord { template_id, fields }
    }

    pub fn read(buf: &[u8], template: &TemplateRecord, ctx: &StructuredContext) -> CodecResult<(Self, usize)> {
        let mut offset = 0;
        let mut fields = Vec::with_capacity(template.fields.len());
        for specifier in &template.fields {
            let (mut field, consumed) = FieldValue::read(&buf[offset..], specifier, ctx)?;
            offset += consumed;
            if is_padding_field(specifier)? {
                // The reader MUST skip this field's decoded value.
                field.data = FieldData::Scalar(Value::Bytes(Vec::new()));
            }
            fields.push(field);
        }
        Ok((
            DataRecord {
                template_id: template.template_id,
                fields,
            },
            offset,
        ))
    }

    /// Writes the record. If one of its fields names `paddingOctets`, its
    /// content is recomputed here (not taken from `self.fields`) as the
    /// shortest NUL pad that aligns the record's total length to 4 octets.
    pub fn write(&self, out: &mut Vec<u8>) -> CodecResult<()> {
        let pad_index = self
            .fields
            .iter()
            .position(|f| is_padding_field(&f.specifier).unwrap_or(false));

        let pad_index = match pad_index {
            None => {
                for field in &self.fields {
                    field.write(out)?;
                }
                return Ok(());
            }
            Some(idx) => idx,
        };

        let mut before = Vec::new();
        for field in &self.fields[..pad_index] {
            field.write(&mut before)?;
        }
        let mut after = Vec::new();
        for field in &self.fields[pad_index + 1..] {
            field.write(&mut after)?;
        }

        let other_len = before.len() + after.len();
        // Shortest pad so that other_len + 1 (length prefix) + pad_len is a
        // multiple of 4.
        let remainder = (other_len + 1) % 4;
        let pad_len = if remainder == 0 { 0 } else { 4 - remainder };

        out.extend_from_slice(&before);
        field_value::write_varlen_payload(&vec![0u8; pad_len], out);
        out.extend_from_slice(&after);
        Ok(())
    }
}

fn is_padding_field(specifier: &FieldSpecifier) -> CodecResult<bool> {
    let ie = specifier.resolve()?;
    Ok(ie.enterprise == 0 && ie.name == PADDING_OCTETS_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::field_specifier::FieldSpecifier;
    use crate::structured::StructuredContext;
    use crate::template::TemplateRecord;
    use pretty_assertions::assert_eq;

    struct NoResolver;
    impl crate::structured::TemplateResolver for NoResolver {
        fn resolve_ingest_template(&self, _template_id: u16) -> Option<TemplateRecord> {
            None
        }
    }

    #[test]
    fn scenario_d_padding_octets_alignment() {
        crate::ie::global().register(crate::ie::InformationElement::new(
            0,
            210,
            "paddingOctets",
            crate::ie::IeType::OctetArray,
        ));
        let template = TemplateRecord::new(
            302,
            vec![
                FieldSpecifier::new(0, 1, 8),   // octetDeltaCount
                FieldSpecifier::new(0, 210, 0xFFFF), // paddingOctets, variable
                FieldSpecifier::new(0, 2, 8),   // packetDeltaCount
            ],
        )
        .unwrap();
        let record = DataRecord::new(
            302,
            vec![
                FieldValue::scalar(template.fields[0].clone(), Value::Unsigned(10)),
                FieldValue::scalar(template.fields[1].clone(), Value::Bytes(Vec::new())),
                FieldValue::scalar(template.fields[2].clone(), Value::Unsigned(3)),
            ],
        );
        let mut out = Vec::new();
        record.write(&mut out).unwrap();
        assert_eq!(out.len() % 4, 0);
        assert_eq!(out.len(), 20); // 8 + (1-octet prefix + 3 pad octets) + 8

        let resolver = NoResolver;
        let ctx = StructuredContext::new(&resolver, 8);
        let (decoded, consumed) = DataRecord::read(&out, &template, &ctx).unwrap();
        assert_eq!(consumed, out.len());
        assert_eq!(decoded.fields[0].data, FieldData::Scalar(Value::Unsigned(10)));
        assert_eq!(decoded.fields[1].data, FieldData::Scalar(Value::Bytes(Vec::new())));
        assert_eq!(decoded.fields[2].data, FieldData::Scalar(Value::Unsigned(3)));
    }
}

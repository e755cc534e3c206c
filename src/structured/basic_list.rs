//! basicList (RFC 6313 §4.5.1): semantic + one field specifier + a dense
//! sequence of values of that single field type.

use crate::codec::Value;
use crate::error::{CodecError, CodecResult};
use crate::field_specifier::FieldSpecifier;
use crate::field_value;

use super::Semantic;

#[derive(Debug, Clone, PartialEq)]
pub struct BasicList {
    pub semantic: Semantic,
    pub specifier: FieldSpecifier,
    pub values: Vec<Value>,
}

impl BasicList {
    pub fn new(semantic: Semantic, specifier: FieldSpecifier, values: Vec<Value>) -> Self {
        BasicList {
            semantic,
            specifier,
            values,
        }
    }

    /// `payload` is the basicList's content with the outer variable-length
    /// framing already stripped.
    pub fn read(payload: &[u8]) -> CodecResult<Self> {
        if payload.is_empty() {
            return Err(CodecError::ShortRead {
                needed: 1,
                available: 0,
            });
        }
        let semantic = Semantic::from_octet(payload[0])?;
        let (specifier, consumed) = FieldSpecifier::read(&payload[1..])?;
        let ie = specifier.resolve()?;
        let mut offset = 1 + consumed;
        let mut values = Vec::new();
        while offset < payload.len() {
            let (value, used) = field_value::read_scalar(ie.ty, specifier.length, &payload[offset..])?;
            offset += used;
            values.push(value);
        }
        Ok(BasicList {
            semantic,
            specifier,
            values,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) -> CodecResult<()> {
        out.push(self.semantic.to_octet());
        self.specifier.write(out);
        let ie = self.specifier.resolve()?;
        for value in &self.values {
            field_value::write_scalar(ie.ty, self.specifier.length, value, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    #[test]
    fn scenario_e_basic_list_of_ipv4_addresses() {
        let specifier = FieldSpecifier::new(0, 8, 4); // sourceIPv4Address
        let list = BasicList::new(
            Semantic::AllOf,
            specifier,
            vec![
                Value::Ipv4(Ipv4Addr::new(10, 0, 0, 1)),
                Value::Ipv4(Ipv4Addr::new(10, 0, 0, 2)),
            ],
        );
        let mut out = Vec::new();
        list.write(&mut out).unwrap();
        assert_eq!(out[0], 0x03);
        assert_eq!(out.len(), 1 + 4 + 4 + 4);
        let decoded = BasicList::read(&out).unwrap();
        assert_eq!(decoded, list);
    }
}

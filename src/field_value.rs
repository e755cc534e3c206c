//! Field Value (§4.4): a (field specifier, decoded value) pair, with the
//! variable-length framing rules of RFC 7011 §7 and the RFC 6313 structured
//! data types layered on top of the scalar type codec.

use crate::codec::{self, Value};
use crate::error::{CodecError, CodecResult};
use crate::field_specifier::{FieldSpecifier, VARIABLE_LENGTH};
use crate::ie::{IeType, InformationElement};
use crate::structured::{BasicList, StructuredContext, SubTemplateList};

/// A bound (field specifier, value) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub specifier: FieldSpecifier,
    pub data: FieldData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Scalar(Value),
    Structured(StructuredValue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    BasicList(BasicList),
    SubTemplateList(SubTemplateList),
}

impl FieldValue {
    pub fn scalar(specifier: FieldSpecifier, value: Value) -> Self {
        FieldValue {
            specifier,
            data: FieldData::Scalar(value),
        }
    }

    /// Decodes one field value from `buf`, returning the value and the
    /// number of octets consumed. `ctx` supplies the template resolver and
    /// recursion-depth budget needed only when the field is a subTemplateList.
    pub fn read(buf: &[u8], specifier: &FieldSpecifier, ctx: &StructuredContext) -> CodecResult<(Self, usize)> {
        let ie = specifier.resolve()?;
        if ie.ty.is_structured() {
            let (payload, prefix_len) = read_varlen_payload(buf)?;
            let structured = match ie.ty {
                IeType::BasicList => StructuredValue::BasicList(BasicList::read(payload)?),
                IeType::SubTemplateList => StructuredValue::SubTemplateList(SubTemplateList::read(payload, ctx)?),
                _ => unreachable!(),
            };
            return Ok((
                FieldValue {
                    specifier: specifier.clone(),
                    data: FieldData::Structured(structured),
                },
                prefix_len + payload.len(),
            ));
        }
        let (value, consumed) = read_scalar(ie.ty, specifier.length, buf)?;
        check_constraint(&ie, &value)?;
        Ok((
            FieldValue {
                specifier: specifier.clone(),
                data: FieldData::Scalar(value),
            },
            consumed,
        ))
    }

    pub fn write(&self, out: &mut Vec<u8>) -> CodecResult<()> {
        match &self.data {
            FieldData::Scalar(value) => {
                let ie = self.specifier.resolve()?;
                check_constraint(&ie, value)?;
                write_scalar(ie.ty, self.specifier.length, value, out)
            }
            FieldData::Structured(StructuredValue::BasicList(list)) => {
                let mut payload = Vec::new();
                list.write(&mut payload)?;
                write_varlen_payload(&payload, out);
                Ok(())
            }
            FieldData::Structured(StructuredValue::SubTemplateList(list)) => {
                let mut payload = Vec::new();
                list.write(&mut payload)?;
                write_varlen_payload(&payload, out);
                Ok(())
            }
        }
    }
}

/// Reads a scalar value honoring the field specifier's length (fixed or
/// variable-length framed).
pub fn read_scalar(ty: IeType, length: u16, buf: &[u8]) -> CodecResult<(Value, usize)> {
    if length == VARIABLE_LENGTH {
        let (payload, prefix_len) = read_varlen_payload(buf)?;
        let value = codec::unpack(ty, payload.len() as u16, payload)?;
        Ok((value, prefix_len + payload.len()))
    } else {
        if buf.len() < length as usize {
            return Err(CodecError::ShortRead {
                needed: length as usize,
                available: buf.len(),
            });
        }
        let value = codec::unpack(ty, length, &buf[..length as usize])?;
        Ok((value, length as usize))
    }
}

pub fn write_scalar(ty: IeType, length: u16, value: &Value, out: &mut Vec<u8>) -> CodecResult<()> {
    if length == VARIABLE_LENGTH {
        let natural = natural_wire_length(ty, value);
        let payload = codec::pack(ty, natural, value)?;
        write_varlen_payload(&payload, out);
        Ok(())
    } else {
        let bytes = codec::pack(ty, length, value)?;
        out.extend_from_slice(&bytes);
        Ok(())
    }
}

/// Runs `ie`'s min/max/choice constraint (if any) against `value`, on both
/// the encode and decode paths (§4.4: "On create... On decode, the same
/// constraints run"). No-op for IEs without a constraint or for values the
/// constraint model doesn't cover (non-integer types).
fn check_constraint(ie: &InformationElement, value: &Value) -> CodecResult<()> {
    let constraint = match &ie.constraint {
        Some(c) => c,
        None => return Ok(()),
    };
    let as_i64 = match value {
        Value::Unsigned(v) => i64::try_from(*v).ok(),
        Value::Signed(v) => Some(*v),
        _ => None,
    };
    let as_i64 = match as_i64 {
        Some(v) => v,
        None => return Ok(()),
    };
    constraint.check(as_i64).map_err(|detail| CodecError::ConstraintViolation {
        field: ie.name.to_string(),
        detail,
    })
}

fn natural_wire_length(ty: IeType, value: &Value) -> u16 {
    match value {
        Value::String(s) => s.len() as u16,
        Value::Bytes(b) => b.len() as u16,
        _ => ty.natural_length(),
    }
}

/// Splits off the variable-length-framed payload at the head of `buf`,
/// returning (payload slice, prefix octets consumed).
pub fn read_varlen_payload(buf: &[u8]) -> CodecResult<(&[u8], usize)> {
    if buf.is_empty() {
        return Err(CodecError::ShortRead {
            needed: 1,
            available: 0,
        });
    }
    let first = buf[0];
    if first != 0xFF {
        let len = first as usize;
        if buf.len() < 1 + len {
            return Err(CodecError::ShortRead {
                needed: 1 + len,
                available: buf.len(),
            });
        }
        Ok((&buf[1..1 + len], 1))
    } else {
        if buf.len() < 3 {
            return Err(CodecError::ShortRead {
                needed: 3,
                available: buf.len(),
            });
        }
        let len = u16::from_be_bytes([buf[1], buf[2]]) as usize;
        if buf.len() < 3 + len {
            return Err(CodecError::ShortRead {
                needed: 3 + len,
                available: buf.len(),
            });
        }
        Ok((&buf[3..3 + len], 3))
    }
}

/// Writes `payload` using RFC 7011 §7 variable-length framing: a 1-octet
/// length for payloads under 255 octets, else 0xFF followed by a 2-octet length.
pub fn write_varlen_payload(payload: &[u8], out: &mut Vec<u8>) {
    if payload.len() < 255 {
        out.push(payload.len() as u8);
    } else {
        out.push(0xFF);
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    }
    out.extend_from_slice(payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn varlen_short_payload_uses_one_octet_prefix() {
        let mut out = Vec::new();
        write_varlen_payload(b"eth0", &mut out);
        assert_eq!(out, vec![4, b'e', b't', b'h', b'0']);
    }

    #[test]
    fn varlen_long_payload_uses_extended_prefix() {
        let payload = vec![0x41u8; 300];
        let mut out = Vec::new();
        write_varlen_payload(&payload, &mut out);
        assert_eq!(&out[..3], &[0xFF, 0x01, 0x2C]);
        assert_eq!(out.len(), 3 + 300);
    }

    #[test]
    fn constraint_violation_on_write_of_an_out_of_choice_value() {
        let specifier = FieldSpecifier::new(0, 61, 1); // flowDirection, choices [0, 1]
        let field = FieldValue::scalar(specifier, Value::Unsigned(2));
        let mut out = Vec::new();
        let err = field.write(&mut out).unwrap_err();
        assert!(matches!(err, CodecError::ConstraintViolation { .. }));
    }

    #[test]
    fn constraint_violation_on_decode_of_an_out_of_choice_value() {
        use crate::structured::{StructuredContext, TemplateResolver};
        use crate::template::TemplateRecord;

        struct NoResolver;
        impl TemplateResolver for NoResolver {
            fn resolve_ingest_template(&self, _: u16) -> Option<TemplateRecord> {
                None
            }
        }

        let specifier = FieldSpecifier::new(0, 61, 1);
        let buf = [2u8]; // not in the allowed [0, 1] set
        let resolver = NoResolver;
        let ctx = StructuredContext::new(&resolver, 8);
        let err = FieldValue::read(&buf, &specifier, &ctx).unwrap_err();
        assert!(matches!(err, CodecError::ConstraintViolation { .. }));
    }

    #[test]
    fn constrained_value_within_choices_round_trips() {
        use crate::structured::{StructuredContext, TemplateResolver};
        use crate::template::TemplateRecord;

        struct NoResolver;
        impl TemplateResolver for NoResolver {
            fn resolve_ingest_template(&self, _: u16) -> Option<TemplateRecord> {
                None
            }
        }

        let specifier = FieldSpecifier::new(0, 61, 1);
        let field = FieldValue::scalar(specifier.clone(), Value::Unsigned(1));
        let mut out = Vec::new();
        field.write(&mut out).unwrap();

        let resolver = NoResolver;
        let ctx = StructuredContext::new(&resolver, 8);
        let (decoded, consumed) = FieldValue::read(&out, &specifier, &ctx).unwrap();
        assert_eq!(consumed, out.len());
        assert_eq!(decoded.data, FieldData::Scalar(Value::Unsigned(1)));
    }

    #[test]
    fn varlen_round_trip_preserves_length() {
        let payload = vec![7u8; 260];
        let mut out = Vec::new();
        write_varlen_payload(&payload, &mut out);
        let (decoded, prefix) = read_varlen_payload(&out).unwrap();
        assert_eq!(prefix, 3);
        assert_eq!(decoded, &payload[..]);
    }
}

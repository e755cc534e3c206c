//! Type codec: per-IE-type pack/unpack, including RFC 7011 §6.2 reduced-size
//! integer encoding. Everything is big-endian (network byte order).

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{CodecError, CodecResult};
use crate::ie::IeType;

/// A decoded scalar field value. Structured values (basicList,
/// subTemplateList) are not represented here; see `field_value::FieldValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Float32(f32),
    Float64(f64),
    Boolean(bool),
    Mac([u8; 6]),
    String(String),
    Bytes(Vec<u8>),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

/// Encodes `value` for an IE of abstract type `ty` at the given wire `length`.
///
/// For the integer and dateTime families `length` may be less than the
/// type's natural width (reduced-size encoding): the value is truncated to
/// its low-order `length` octets, which is lossless provided the value fits.
pub fn pack(ty: IeType, length: u16, value: &Value) -> CodecResult<Vec<u8>> {
    let length = length as usize;
    match (ty, value) {
        (
            IeType::Unsigned8 | IeType::Unsigned16 | IeType::Unsigned32 | IeType::Unsigned64,
            Value::Unsigned(v),
        ) => pack_unsigned(*v, ty, length),
        (
            IeType::DateTimeSeconds
            | IeType::DateTimeMilliseconds
            | IeType::DateTimeMicroseconds
            | IeType::DateTimeNanoseconds,
            Value::Unsigned(v),
        ) => pack_unsigned(*v, ty, length),
        (IeType::Signed8 | IeType::Signed16 | IeType::Signed32 | IeType::Signed64, Value::Signed(v)) => {
            pack_signed(*v, ty, length)
        }
        (IeType::Float32, Value::Float32(v)) => {
            expect_length(ty, length, 4)?;
            Ok(v.to_be_bytes().to_vec())
        }
        (IeType::Float64, Value::Float64(v)) => {
            expect_length(ty, length, 8)?;
            Ok(v.to_be_bytes().to_vec())
        }
        (IeType::Boolean, Value::Boolean(v)) => {
            expect_length(ty, length, 1)?;
            Ok(vec![if *v { 1 } else { 2 }])
        }
        (IeType::MacAddress, Value::Mac(v)) => {
            expect_length(ty, length, 6)?;
            Ok(v.to_vec())
        }
        (IeType::String, Value::String(v)) => {
            let mut bytes = v.as_bytes().to_vec();
            if length != 65535 {
                bytes.resize(length, b' ');
                bytes.truncate(length);
            }
            Ok(bytes)
        }
        (IeType::OctetArray, Value::Bytes(v)) => Ok(v.clone()),
        (IeType::Ipv4Address, Value::Ipv4(v)) => {
            expect_length(ty, length, 4)?;
            Ok(v.octets().to_vec())
        }
        (IeType::Ipv6Address, Value::Ipv6(v)) => {
            expect_length(ty, length, 16)?;
            Ok(v.octets().to_vec())
        }
        _ => Err(CodecError::LengthMismatch {
            expected: ty.natural_length() as usize,
            actual: length,
        }),
    }
}

/// Decodes `bytes` (exactly `length` octets) as an IE of abstract type `ty`.
pub fn unpack(ty: IeType, length: u16, bytes: &[u8]) -> CodecResult<Value> {
    if bytes.len() != length as usize {
        return Err(CodecError::LengthMismatch {
            expected: length as usize,
            actual: bytes.len(),
        });
    }
    match ty {
        IeType::Unsigned8
        | IeType::Unsigned16
        | IeType::Unsigned32
        | IeType::Unsigned64
        | IeType::DateTimeSeconds
        | IeType::DateTimeMilliseconds
        | IeType::DateTimeMicroseconds
        | IeType::DateTimeNanoseconds => Ok(Value::Unsigned(unpack_unsigned(bytes, ty)?)),
        IeType::Signed8 | IeType::Signed16 | IeType::Signed32 | IeType::Signed64 => {
            Ok(Value::Signed(unpack_signed(bytes, ty)?))
        }
        IeType::Float32 => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| length_mismatch(4, bytes.len()))?;
            Ok(Value::Float32(f32::from_be_bytes(arr)))
        }
        IeType::Float64 => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| length_mismatch(8, bytes.len()))?;
            Ok(Value::Float64(f64::from_be_bytes(arr)))
        }
        IeType::Boolean => {
            if bytes.len() != 1 {
                return Err(length_mismatch(1, bytes.len()));
            }
            // RFC 2579: 1 = true, 2 = false. Any other octet is out of range.
            match bytes[0] {
                1 => Ok(Value::Boolean(true)),
                2 => Ok(Value::Boolean(false)),
                other => Err(CodecError::ValueOutOfRange {
                    field: format!("boolean octet {}", other),
                }),
            }
        }
        IeType::MacAddress => {
            let arr: [u8; 6] = bytes.try_into().map_err(|_| length_mismatch(6, bytes.len()))?;
            Ok(Value::Mac(arr))
        }
        IeType::String => {
            let s = String::from_utf8_lossy(bytes);
            Ok(Value::String(s.trim_end_matches(['\0', ' ']).to_string()))
        }
        IeType::OctetArray => Ok(Value::Bytes(bytes.to_vec())),
        IeType::Ipv4Address => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| length_mismatch(4, bytes.len()))?;
            Ok(Value::Ipv4(Ipv4Addr::from(arr)))
        }
        IeType::Ipv6Address => {
            let arr: [u8; 16] = bytes.try_into().map_err(|_| length_mismatch(16, bytes.len()))?;
            Ok(Value::Ipv6(Ipv6Addr::from(arr)))
        }
        IeType::BasicList | IeType::SubTemplateList => Err(CodecError::UnknownType { length }),
    }
}

fn length_mismatch(expected: usize, actual: usize) -> CodecError {
    CodecError::LengthMismatch { expected, actual }
}

fn expect_length(ty: IeType, length: usize, natural: usize) -> CodecResult<()> {
    if length != natural {
        return Err(CodecError::LengthMismatch {
            expected: ty.natural_length() as usize,
            actual: length,
        });
    }
    Ok(())
}

fn pack_unsigned(value: u64, ty: IeType, length: usize) -> CodecResult<Vec<u8>> {
    let natural = ty.natural_length() as usize;
    if length == 0 || length > natural {
        return Err(CodecError::LengthMismatch {
            expected: natural,
            actual: length,
        });
    }
    let full = value.to_be_bytes();
    // `full` is 8 bytes; the low-order `length` bytes carry the value,
    // provided it actually fits (reduced-size encoding, RFC 7011 §6.2).
    if length < 8 && value >> (length * 8) != 0 {
        return Err(CodecError::ValueOutOfRange {
            field: format!("unsigned value {} does not fit in {} octets", value, length),
        });
    }
    Ok(full[8 - length..].to_vec())
}

fn unpack_unsigned(bytes: &[u8], ty: IeType) -> CodecResult<u64> {
    let natural = ty.natural_length() as usize;
    if bytes.is_empty() || bytes.len() > natural {
        return Err(CodecError::LengthMismatch {
            expected: natural,
            actual: bytes.len(),
        });
    }
    let mut full = [0u8; 8];
    full[8 - bytes.len()..].copy_from_slice(bytes);
    Ok(u64::from_be_bytes(full))
}

fn pack_signed(value: i64, ty: IeType, length: usize) -> CodecResult<Vec<u8>> {
    let natural = ty.natural_length() as usize;
    if length == 0 || length > natural {
        return Err(CodecError::LengthMismatch {
            expected: natural,
            actual: length,
        });
    }
    // Legal range for `length` sign-extended octets is [-(2^(8L-1)), 2^(8L-1)-1].
    if length < 8 {
        let bits = (length * 8) as u32;
        let max = (1i64 << (bits - 1)) - 1;
        let min = -(1i64 << (bits - 1));
        if value < min || value > max {
            return Err(CodecError::ValueOutOfRange {
                field: format!("signed value {} does not fit in {} octets", value, length),
            });
        }
    }
    let full = value.to_be_bytes();
    Ok(full[8 - length..].to_vec())
}

fn unpack_signed(bytes: &[u8], ty: IeType) -> CodecResult<i64> {
    let natural = ty.natural_length() as usize;
    if bytes.is_empty() || bytes.len() > natural {
        return Err(CodecError::LengthMismatch {
            expected: natural,
            actual: bytes.len(),
        });
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut full = [fill; 8];
    full[8 - bytes.len()..].copy_from_slice(bytes);
    Ok(i64::from_be_bytes(full))
}

//! Field Specifier codec (§4.2): the 4- or 8-octet descriptor binding an
//! information element to a concrete encoded length inside a template.

use crate::error::{CodecError, CodecResult};
use crate::ie::{self, InformationElement};

pub const VARIABLE_LENGTH: u16 = 0xFFFF;
const ENTERPRISE_BIT: u16 = 0x8000;

/// Binds an IE (by enterprise/id) to a concrete wire length for use in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpecifier {
    pub enterprise: u32,
    pub information_element_id: u16,
    pub length: u16,
}

impl FieldSpecifier {
    pub fn new(enterprise: u32, information_element_id: u16, length: u16) -> Self {
        FieldSpecifier {
            enterprise,
            information_element_id,
            length,
        }
    }

    pub fn is_variable_length(&self) -> bool {
        self.length == VARIABLE_LENGTH
    }

    /// Octets this specifier itself occupies on the wire (not the field it describes).
    pub fn wire_len(&self) -> usize {
        if self.enterprise != 0 {
            8
        } else {
            4
        }
    }

    /// Resolves this specifier against the process-wide dictionary.
    pub fn resolve(&self) -> CodecResult<InformationElement> {
        ie::global()
            .lookup_pen_by_id(self.enterprise, self.information_element_id)
            .ok_or(CodecError::UnknownIE {
                enterprise: self.enterprise,
                id: self.information_element_id,
            })
    }

    pub fn read(buf: &[u8]) -> CodecResult<(Self, usize)> {
        if buf.len() < 4 {
            return Err(CodecError::ShortRead {
                needed: 4,
                available: buf.len(),
            });
        }
        let code = u16::from_be_bytes([buf[0], buf[1]]);
        let is_enterprise = code & ENTERPRISE_BIT != 0;
        let id = code & !ENTERPRISE_BIT;
        let length = u16::from_be_bytes([buf[2], buf[3]]);
        if !is_enterprise {
            return Ok((FieldSpecifier::new(0, id, length), 4));
        }
        if buf.len() < 8 {
            return Err(CodecError::ShortRead {
                needed: 8,
                available: buf.len(),
            });
        }
        let enterprise = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        Ok((FieldSpecifier::new(enterprise, id, length), 8))
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let mut code = self.information_element_id;
        if self.enterprise != 0 {
            code |= ENTERPRISE_BIT;
        }
        out.extend_from_slice(&code.to_be_bytes());
        out.extend_from_slice(&self.length.to_be_bytes());
        if self.enterprise != 0 {
            out.extend_from_slice(&self.enterprise.to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_non_enterprise_field() {
        let spec = FieldSpecifier::new(0, 1, 8);
        let mut buf = Vec::new();
        spec.write(&mut buf);
        assert_eq!(buf, vec![0x00, 0x01, 0x00, 0x08]);
        let (decoded, consumed) = FieldSpecifier::read(&buf).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(decoded, spec);
    }

    #[test]
    fn round_trip_enterprise_field_scenario_b() {
        // template 300, enterprise 9, id 100, length 4
        let spec = FieldSpecifier::new(9, 100, 4);
        let mut buf = Vec::new();
        spec.write(&mut buf);
        assert_eq!(buf, vec![0x80, 0x64, 0x00, 0x04, 0x00, 0x00, 0x00, 0x09]);
        let (decoded, consumed) = FieldSpecifier::read(&buf).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(decoded, spec);
    }

    #[test]
    fn short_buffer_on_enterprise_field() {
        let buf = [0x80, 0x64, 0x00, 0x04];
        assert!(FieldSpecifier::read(&buf).is_err());
    }
}

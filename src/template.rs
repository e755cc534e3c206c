//! Template Record / Option Template Record (§4.3).

use crate::error::{CodecError, CodecResult};
use crate::field_specifier::FieldSpecifier;

pub const MIN_TEMPLATE_ID: u16 = 256;

/// A named, ordered sequence of field specifiers identified by a template id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRecord {
    pub template_id: u16,
    pub fields: Vec<FieldSpecifier>,
}

impl TemplateRecord {
    pub const SET_ID: u16 = 2;

    pub fn new(template_id: u16, fields: Vec<FieldSpecifier>) -> CodecResult<Self> {
        validate_template_id(template_id)?;
        if fields.is_empty() {
            return Err(CodecError::InvalidFieldCount(0));
        }
        Ok(TemplateRecord { template_id, fields })
    }

    pub fn read(buf: &[u8]) -> CodecResult<(Self, usize)> {
        if buf.len() < 4 {
            return Err(CodecError::ShortRead {
                needed: 4,
                available: buf.len(),
            });
        }
        let template_id = u16::from_be_bytes([buf[0], buf[1]]);
        let field_count = u16::from_be_bytes([buf[2], buf[3]]);
        validate_template_id(template_id)?;
        if field_count == 0 {
            return Err(CodecError::InvalidFieldCount(0));
        }
        let mut offset = 4;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let (field, consumed) = FieldSpecifier::read(&buf[offset..])?;
            offset += consumed;
            fields.push(field);
        }
        Ok((TemplateRecord { template_id, fields }, offset))
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.template_id.to_be_bytes());
        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            field.write(out);
        }
    }
}

/// An option template additionally designates a prefix of its fields as
/// "scope" fields (RFC 7011 §3.4.2.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionTemplateRecord {
    pub template_id: u16,
    pub scope_field_count: u16,
    pub fields: Vec<FieldSpecifier>,
}

impl OptionTemplateRecord {
    pub const SET_ID: u16 = 3;

    pub fn new(template_id: u16, scope_field_count: u16, fields: Vec<FieldSpecifier>) -> CodecResult<Self> {
        validate_template_id(template_id)?;
        let field_count = fields.len() as u16;
        if field_count == 0 {
            return Err(CodecError::InvalidFieldCount(0));
        }
        validate_scope_count(scope_field_count, field_count)?;
        Ok(OptionTemplateRecord {
            template_id,
            scope_field_count,
            fields,
        })
    }

    pub fn read(buf: &[u8]) -> CodecResult<(Self, usize)> {
        if buf.len() < 6 {
            return Err(CodecError::ShortRead {
                needed: 6,
                available: buf.len(),
            });
        }
        let template_id = u16::from_be_bytes([buf[0], buf[1]]);
        let field_count = u16::from_be_bytes([buf[2], buf[3]]);
        let scope_field_count = u16::from_be_bytes([buf[4], buf[5]]);
        validate_template_id(template_id)?;
        if field_count == 0 {
            return Err(CodecError::InvalidFieldCount(0));
        }
        validate_scope_count(scope_field_count, field_count)?;
        let mut offset = 6;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let (field, consumed) = FieldSpecifier::read(&buf[offset..])?;
            offset += consumed;
            fields.push(field);
        }
        Ok((
            OptionTemplateRecord {
                template_id,
                scope_field_count,
                fields,
            },
            offset,
        ))
    }

    /// The scope field count is written on the wire on encode; some
    /// reference IPFIX implementations omit it (see
    /// `original_source/OptionTemplateRecord.py`), which breaks decoding by
    /// any peer expecting RFC 7011 §3.4.2.2's on-wire layout.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.template_id.to_be_bytes());
        out.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.scope_field_count.to_be_bytes());
        for field in &self.fields {
            field.write(out);
        }
    }

    pub fn scope_fields(&self) -> &[FieldSpecifier] {
        &self.fields[..self.scope_field_count as usize]
    }
}

fn validate_template_id(template_id: u16) -> CodecResult<()> {
    if template_id < MIN_TEMPLATE_ID {
        return Err(CodecError::InvalidTemplateId(template_id));
    }
    Ok(())
}

fn validate_scope_count(scope: u16, fields: u16) -> CodecResult<()> {
    if scope == 0 || scope > fields {
        return Err(CodecError::InvalidScopeCount { scope, fields });
    }
    Ok(())
}

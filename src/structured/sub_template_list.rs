//! subTemplateList (RFC 6313 §4.5.2): semantic + template id + a dense
//! sequence of data records conforming to that template.

use crate::error::{CodecError, CodecResult};
use crate::record::DataRecord;

use super::{Semantic, StructuredContext};

#[derive(Debug, Clone, PartialEq)]
pub struct SubTemplateList {
    pub semantic: Semantic,
    pub template_id: u16,
    pub records: Vec<DataRecord>,
    /// False when the template id could not be resolved against the
    /// enclosing domain's ingest table; the list's bytes were still
    /// consumed, but `records` is empty (§4.6).
    pub resolved: bool,
}

impl SubTemplateList {
    pub fn new(semantic: Semantic, template_id: u16, records: Vec<DataRecord>) -> Self {
        SubTemplateList {
            semantic,
            template_id,
            records,
            resolved: true,
        }
    }

    /// `payload` is the subTemplateList's content with the outer
    /// variable-length framing already stripped.
    pub fn read(payload: &[u8], ctx: &StructuredContext) -> CodecResult<Self> {
        if payload.len() < 3 {
            return Err(CodecError::ShortRead {
                needed: 3,
                available: payload.len(),
            });
        }
        let semantic = Semantic::from_octet(payload[0])?;
        let template_id = u16::from_be_bytes([payload[1], payload[2]]);
        let body = &payload[3..];

        match ctx.resolver().resolve_ingest_template(template_id) {
            None => Ok(SubTemplateList {
                semantic,
                template_id,
                records: Vec::new(),
                resolved: false,
            }),
            Some(template) => {
                let nested = ctx.nested()?;
                let mut offset = 0;
                let mut records = Vec::new();
                while offset < body.len() {
                    let (record, consumed) = DataRecord::read(&body[offset..], &template, &nested)?;
                    offset += consumed;
                    records.push(record);
                }
                Ok(SubTemplateList {
                    semantic,
                    template_id,
                    records,
                    resolved: true,
                })
            }
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> CodecResult<()> {
        out.push(self.semantic.to_octet());
        out.extend_from_slice(&self.template_id.to_be_bytes());
        for record in &self.records {
            record.write(out)?;
        }
        Ok(())
    }
}

//! Set (§4.7): a tagged container of records (template set, option-template
//! set, or data set) with header and 4-octet-aligned padding.

use crate::domain::ObservationDomain;
use crate::error::{CodecError, CodecResult};
use crate::record::DataRecord;
use crate::structured::StructuredContext;
use crate::template::{OptionTemplateRecord, TemplateRecord};

const SET_HEADER_LEN: usize = 4;
const MIN_DATA_SET_ID: u16 = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum SetContent {
    TemplateSet(Vec<TemplateRecord>),
    OptionTemplateSet(Vec<OptionTemplateRecord>),
    DataSet {
        template_id: u16,
        records: Vec<DataRecord>,
        /// False if the ingest template was unknown when this set was
        /// decoded; `records` is then empty even though the set's declared
        /// length was fully consumed (§4.7).
        resolved: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub content: SetContent,
}

impl Set {
    pub fn template_set(templates: Vec<TemplateRecord>) -> Self {
        Set {
            content: SetContent::TemplateSet(templates),
        }
    }

    pub fn option_template_set(templates: Vec<OptionTemplateRecord>) -> Self {
        Set {
            content: SetContent::OptionTemplateSet(templates),
        }
    }

    pub fn data_set(template_id: u16, records: Vec<DataRecord>) -> Self {
        Set {
            content: SetContent::DataSet {
                template_id,
                records,
                resolved: true,
            },
        }
    }

    pub fn set_id(&self) -> u16 {
        match &self.content {
            SetContent::TemplateSet(_) => TemplateRecord::SET_ID,
            SetContent::OptionTemplateSet(_) => OptionTemplateRecord::SET_ID,
            SetContent::DataSet { template_id, .. } => *template_id,
        }
    }

    pub fn data_record_count(&self) -> usize {
        match &self.content {
            SetContent::DataSet { records, .. } => records.len(),
            _ => 0,
        }
    }

    /// Decodes one set from the head of `buf`. Template and option-template
    /// sets are installed into `domain`'s ingest tables as a side effect, so
    /// that later sets in the same message see the update (§5 ordering).
    pub fn read(buf: &[u8], domain: &ObservationDomain, max_depth: usize) -> CodecResult<(Self, usize)> {
        if buf.len() < SET_HEADER_LEN {
            return Err(CodecError::ShortRead {
                needed: SET_HEADER_LEN,
                available: buf.len(),
            });
        }
        let id = u16::from_be_bytes([buf[0], buf[1]]);
        let length = u16::from_be_bytes([buf[2], buf[3]]) as usize;
        if length < SET_HEADER_LEN {
            return Err(CodecError::InvalidLength(length as u16));
        }
        if buf.len() < length {
            return Err(CodecError::ShortRead {
                needed: length,
                available: buf.len(),
            });
        }
        if id == 0 || id == 1 || (4..MIN_DATA_SET_ID).contains(&id) {
            return Err(CodecError::InvalidSetId(id));
        }

        let set_buf = &buf[..length];
        let mut offset = SET_HEADER_LEN;

        let content = if id == TemplateRecord::SET_ID {
            let mut templates = Vec::new();
            while length - offset > SET_HEADER_LEN {
                let (template, consumed) = TemplateRecord::read(&set_buf[offset..])?;
                offset += consumed;
                domain.install_ingest_template(template.clone())?;
                templates.push(template);
            }
            SetContent::TemplateSet(templates)
        } else if id == OptionTemplateRecord::SET_ID {
            let mut templates = Vec::new();
            while length - offset > SET_HEADER_LEN {
                let (template, consumed) = OptionTemplateRecord::read(&set_buf[offset..])?;
                offset += consumed;
                domain.install_ingest_option_template(template.clone())?;
                templates.push(template);
            }
            SetContent::OptionTemplateSet(templates)
        } else {
            let template_id = id;
            match domain.lookup_ingest_template(template_id) {
                None => {
                    log::warn!(
                        "domain {}: data set for unknown template {}, skipping {} octets",
                        domain.domain_id,
                        template_id,
                        length - offset
                    );
                    SetContent::DataSet {
                        template_id,
                        records: Vec::new(),
                        resolved: false,
                    }
                }
                Some(template) => {
                    let ctx = StructuredContext::new(domain, max_depth);
                    let mut records = Vec::new();
                    while length - offset > SET_HEADER_LEN {
                        let (record, consumed) = DataRecord::read(&set_buf[offset..], &template, &ctx)?;
                        offset += consumed;
                        records.push(record);
                    }
                    SetContent::DataSet {
                        template_id,
                        records,
                        resolved: true,
                    }
                }
            }
        };

        Ok((Set { content }, length))
    }

    pub fn write(&self, out: &mut Vec<u8>) -> CodecResult<()> {
        let mut body = Vec::new();
        match &self.content {
            SetContent::TemplateSet(templates) => {
                for t in templates {
                    t.write(&mut body);
                }
            }
            SetContent::OptionTemplateSet(templates) => {
                for t in templates {
                    t.write(&mut body);
                }
            }
            SetContent::DataSet { records, .. } => {
                for r in records {
                    r.write(&mut body)?;
                }
            }
        }

        let unpadded_len = SET_HEADER_LEN + body.len();
        let remainder = unpadded_len % 4;
        let pad = if remainder == 0 { 0 } else { 4 - remainder };
        let total_len = unpadded_len + pad;

        out.extend_from_slice(&self.set_id().to_be_bytes());
        out.extend_from_slice(&(total_len as u16).to_be_bytes());
        out.extend_from_slice(&body);
        out.extend(std::iter::repeat(0u8).take(pad));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::field_specifier::FieldSpecifier;
    use crate::field_value::FieldValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn reserved_set_ids_are_rejected() {
        let domain = ObservationDomain::new(1);
        let buf = [0x00, 0x05, 0x00, 0x04];
        assert!(Set::read(&buf, &domain, 8).is_err());
    }

    #[test]
    fn template_set_round_trip_and_installs_into_domain() {
        let domain = ObservationDomain::new(1);
        let template = TemplateRecord::new(256, vec![FieldSpecifier::new(0, 1, 8)]).unwrap();
        let set = Set::template_set(vec![template.clone()]);
        let mut buf = Vec::new();
        set.write(&mut buf).unwrap();
        assert_eq!(buf.len() % 4, 0);

        let (decoded, consumed) = Set::read(&buf, &domain, 8).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, set);
        assert_eq!(domain.lookup_ingest_template(256).unwrap(), template);
    }

    #[test]
    fn data_set_for_unknown_template_is_skipped_without_error() {
        let domain = ObservationDomain::new(1);
        let template = TemplateRecord::new(256, vec![FieldSpecifier::new(0, 1, 8)]).unwrap();
        let record = DataRecord::new(
            256,
            vec![FieldValue::scalar(template.fields[0].clone(), Value::Unsigned(42))],
        );
        let set = Set::data_set(256, vec![record]);
        let mut buf = Vec::new();
        set.write(&mut buf).unwrap();

        let (decoded, consumed) = Set::read(&buf, &domain, 8).unwrap();
        assert_eq!(consumed, buf.len());
        match decoded.content {
            SetContent::DataSet { resolved, records, .. } => {
                assert!(!resolved);
                assert!(records.is_empty());
            }
            _ => panic!("expected a data set"),
        }
    }

    #[test]
    fn scenario_a_minimal_data_set_round_trip() {
        let domain = ObservationDomain::new(1);
        let template = TemplateRecord::new(256, vec![FieldSpecifier::new(0, 1, 8)]).unwrap();
        domain.install_ingest_template(template.clone()).unwrap();
        let record = DataRecord::new(
            256,
            vec![FieldValue::scalar(template.fields[0].clone(), Value::Unsigned(42))],
        );
        let set = Set::data_set(256, vec![record]);
        let mut buf = Vec::new();
        set.write(&mut buf).unwrap();
        assert_eq!(buf.len(), 4 + 8); // set header + one 8-octet value, already 4-aligned

        let (decoded, _) = Set::read(&buf, &domain, 8).unwrap();
        match decoded.content {
            SetContent::DataSet { records, resolved, .. } => {
                assert!(resolved);
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].fields[0].data, crate::field_value::FieldData::Scalar(Value::Unsigned(42)));
            }
            _ => panic!("expected a data set"),
        }
    }
}

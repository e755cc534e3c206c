//! Observation Domain (§4.9): per-domain sequencing plus ingest/egress
//! template tables, serialized behind one mutex per direction (§5).

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{CodecError, CodecResult};
use crate::structured::TemplateResolver;
use crate::template::{OptionTemplateRecord, TemplateRecord};

/// Per-domain counter tracking cumulative data records emitted/received and
/// the latest export time (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequencer {
    pub next_seq: u32,
    pub last_export_time: u32,
}

impl Default for Sequencer {
    fn default() -> Self {
        Sequencer {
            next_seq: 1,
            last_export_time: 0,
        }
    }
}

impl Sequencer {
    pub fn update(&mut self, data_record_count: u32, export_time: u32) {
        self.next_seq = self.next_seq.wrapping_add(data_record_count);
        self.last_export_time = self.last_export_time.max(export_time);
    }
}

#[derive(Default)]
struct TemplateTables {
    templates: HashMap<u16, TemplateRecord>,
    option_templates: HashMap<u16, OptionTemplateRecord>,
}

impl TemplateTables {
    fn install_template(&mut self, domain_id: u32, template: TemplateRecord) -> CodecResult<()> {
        if self.option_templates.contains_key(&template.template_id) {
            return Err(CodecError::TemplateIdCollision {
                domain_id,
                template_id: template.template_id,
                existing: "option template",
            });
        }
        if let Some(prev) = self.templates.get(&template.template_id) {
            if prev.fields != template.fields {
                log::debug!(
                    "domain {}: replacing template {} (field layout changed)",
                    domain_id,
                    template.template_id
                );
            }
        }
        self.templates.insert(template.template_id, template);
        Ok(())
    }

    fn install_option_template(&mut self, domain_id: u32, template: OptionTemplateRecord) -> CodecResult<()> {
        if self.templates.contains_key(&template.template_id) {
            return Err(CodecError::TemplateIdCollision {
                domain_id,
                template_id: template.template_id,
                existing: "template",
            });
        }
        if let Some(prev) = self.option_templates.get(&template.template_id) {
            if prev.fields != template.fields {
                log::debug!(
                    "domain {}: replacing option template {} (field layout changed)",
                    domain_id,
                    template.template_id
                );
            }
        }
        self.option_templates.insert(template.template_id, template);
        Ok(())
    }
}

/// Holds the ingest and egress template tables and sequencers for one
/// observation domain id.
pub struct ObservationDomain {
    pub domain_id: u32,
    ingest: Mutex<TemplateTables>,
    egress: Mutex<TemplateTables>,
    pub ingest_sequencer: Mutex<Sequencer>,
    pub egress_sequencer: Mutex<Sequencer>,
}

impl ObservationDomain {
    pub fn new(domain_id: u32) -> Self {
        ObservationDomain {
            domain_id,
            ingest: Mutex::new(TemplateTables::default()),
            egress: Mutex::new(TemplateTables::default()),
            ingest_sequencer: Mutex::new(Sequencer::default()),
            egress_sequencer: Mutex::new(Sequencer::default()),
        }
    }

    pub fn install_ingest_template(&self, template: TemplateRecord) -> CodecResult<()> {
        self.ingest.lock().unwrap().install_template(self.domain_id, template)
    }

    pub fn install_ingest_option_template(&self, template: OptionTemplateRecord) -> CodecResult<()> {
        self.ingest
            .lock()
            .unwrap()
            .install_option_template(self.domain_id, template)
    }

    pub fn install_egress_template(&self, template: TemplateRecord) -> CodecResult<()> {
        self.egress.lock().unwrap().install_template(self.domain_id, template)
    }

    pub fn install_egress_option_template(&self, template: OptionTemplateRecord) -> CodecResult<()> {
        self.egress
            .lock()
            .unwrap()
            .install_option_template(self.domain_id, template)
    }

    pub fn lookup_ingest_template(&self, template_id: u16) -> Option<TemplateRecord> {
        self.ingest.lock().unwrap().templates.get(&template_id).cloned()
    }

    pub fn lookup_ingest_option_template(&self, template_id: u16) -> Option<OptionTemplateRecord> {
        self.ingest
            .lock()
            .unwrap()
            .option_templates
            .get(&template_id)
            .cloned()
    }

    pub fn egress_templates(&self) -> Vec<TemplateRecord> {
        self.egress.lock().unwrap().templates.values().cloned().collect()
    }

    pub fn egress_option_templates(&self) -> Vec<OptionTemplateRecord> {
        self.egress
            .lock()
            .unwrap()
            .option_templates
            .values()
            .cloned()
            .collect()
    }

    pub fn reset_egress_sequencer(&self) {
        *self.egress_sequencer.lock().unwrap() = Sequencer::default();
    }
}

impl TemplateResolver for ObservationDomain {
    fn resolve_ingest_template(&self, template_id: u16) -> Option<TemplateRecord> {
        self.lookup_ingest_template(template_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_specifier::FieldSpecifier;

    fn template(id: u16) -> TemplateRecord {
        TemplateRecord::new(id, vec![FieldSpecifier::new(0, 1, 8)]).unwrap()
    }

    #[test]
    fn template_and_option_template_ids_collide() {
        let domain = ObservationDomain::new(1);
        domain.install_ingest_template(template(500)).unwrap();
        let opt = OptionTemplateRecord::new(500, 1, vec![FieldSpecifier::new(0, 1, 8)]).unwrap();
        assert!(domain.install_ingest_option_template(opt).is_err());
    }

    #[test]
    fn sequencer_monotonicity_property_4() {
        let mut seq = Sequencer::default();
        assert_eq!(seq.next_seq, 1);
        seq.update(3, 100);
        assert_eq!(seq.next_seq, 4);
        seq.update(5, 50); // backward time tolerated, never decreases last_export_time
        assert_eq!(seq.next_seq, 9);
        assert_eq!(seq.last_export_time, 100);
    }

    #[test]
    fn template_replacement_is_allowed() {
        let domain = ObservationDomain::new(1);
        domain.install_ingest_template(template(500)).unwrap();
        let replacement = TemplateRecord::new(500, vec![FieldSpecifier::new(0, 2, 4)]).unwrap();
        domain.install_ingest_template(replacement.clone()).unwrap();
        assert_eq!(domain.lookup_ingest_template(500).unwrap(), replacement);
    }
}

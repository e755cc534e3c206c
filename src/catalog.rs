//! Template catalog (§6): a JSON-driven registry of named templates that can
//! be injected wholesale into a domain's ingest or egress table.

use std::collections::HashMap;

use serde::Deserialize;

use crate::collector::Collector;
use crate::error::ConfigError;
use crate::exporter::Exporter;
use crate::field_specifier::{FieldSpecifier, VARIABLE_LENGTH};
use crate::ie::{self, IeType};
use crate::template::{TemplateRecord, MIN_TEMPLATE_ID};

const IANA_ALIAS: &str = "IANA";

/// The entity a catalog's templates are injected into: an exporter's egress
/// tables or a collector's ingest tables (§4.13).
pub enum CatalogTarget<'a> {
    Exporter(&'a Exporter),
    Collector(&'a Collector),
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    name: String,
    enterprise: String,
    length: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct TemplateDef {
    fields: Vec<FieldDef>,
}

/// A catalog loaded from a JSON document mapping template ids (as decimal
/// strings, since JSON object keys are always strings) to field lists.
pub struct TemplatesCatalog {
    templates: HashMap<u16, TemplateRecord>,
}

impl TemplatesCatalog {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: HashMap<String, TemplateDef> =
            serde_json::from_str(text).map_err(|e| ConfigError::MalformedCatalog(e.to_string()))?;

        let mut templates = HashMap::with_capacity(raw.len());
        for (key, def) in raw {
            let template_id: u16 = key
                .parse()
                .map_err(|_| ConfigError::MalformedCatalog(format!("non-numeric template id {:?}", key)))?;
            if template_id < MIN_TEMPLATE_ID {
                return Err(ConfigError::MalformedCatalog(format!(
                    "template id {} below minimum {}",
                    template_id, MIN_TEMPLATE_ID
                )));
            }

            let mut fields = Vec::with_capacity(def.fields.len());
            for (index, field) in def.fields.iter().enumerate() {
                fields.push(resolve_field(template_id, index, field)?);
            }

            let template = TemplateRecord::new(template_id, fields)
                .map_err(|e| ConfigError::MalformedCatalog(e.to_string()))?;
            templates.insert(template_id, template);
        }
        Ok(TemplatesCatalog { templates })
    }

    pub fn template_ids(&self) -> Vec<u16> {
        self.templates.keys().copied().collect()
    }

    pub fn template(&self, template_id: u16) -> Option<&TemplateRecord> {
        self.templates.get(&template_id)
    }

    /// Installs the named (or, if `None`, all) templates into `session`'s
    /// domain `domain_id` as egress templates (for exporters) or ingest
    /// templates (for collectors).
    pub fn inject_into(
        &self,
        domain: &crate::domain::ObservationDomain,
        template_ids: Option<&[u16]>,
        as_egress: bool,
    ) -> Result<(), ConfigError> {
        let ids: Vec<u16> = match template_ids {
            Some(ids) => ids.to_vec(),
            None => self.template_ids(),
        };
        for id in ids {
            let template = self
                .templates
                .get(&id)
                .ok_or_else(|| ConfigError::MalformedCatalog(format!("unknown catalog template {}", id)))?
                .clone();
            let installed = if as_egress {
                domain.install_egress_template(template)
            } else {
                domain.install_ingest_template(template)
            };
            installed.map_err(|e| ConfigError::MalformedCatalog(e.to_string()))?;
        }
        Ok(())
    }

    /// Installs the named (or, if `None`, all) templates into `domain_id`
    /// (or, if `None`, every domain `target`'s session already knows about)
    /// as egress templates for an exporter or ingest templates for a
    /// collector. When `target` is an exporter and `trigger_refresh` is set,
    /// an immediate template refresh follows the injection. A collector
    /// never refreshes — requesting one against a collector is rejected.
    pub fn inject_all(
        &self,
        target: CatalogTarget<'_>,
        domain_id: Option<u32>,
        template_ids: Option<&[u16]>,
        trigger_refresh: bool,
    ) -> Result<(), ConfigError> {
        if trigger_refresh && matches!(target, CatalogTarget::Collector(_)) {
            return Err(ConfigError::RefreshNotSupportedOnCollector);
        }

        let (session, as_egress) = match &target {
            CatalogTarget::Exporter(exporter) => (exporter.session(), true),
            CatalogTarget::Collector(collector) => (collector.session(), false),
        };
        let domain_ids = match domain_id {
            Some(id) => vec![id],
            None => session.domain_ids(),
        };
        for id in domain_ids {
            let domain = session.domain(id);
            self.inject_into(&domain, template_ids, as_egress)?;
        }

        if let CatalogTarget::Exporter(exporter) = target {
            if trigger_refresh {
                exporter
                    .refresh_templates()
                    .map_err(|e| ConfigError::MalformedCatalog(format!("template refresh failed: {}", e)))?;
            }
        }
        Ok(())
    }
}

fn resolve_field(template_id: u16, index: usize, field: &FieldDef) -> Result<FieldSpecifier, ConfigError> {
    let enterprise = resolve_enterprise_alias(&field.enterprise)?;
    let dictionary = ie::global();
    let element = if enterprise == ie::IANA {
        dictionary.lookup_iana_by_name(&field.name)
    } else {
        dictionary.lookup_pen_by_name(enterprise, &field.name)
    }
    .ok_or_else(|| ConfigError::UnknownCatalogField {
        template_id,
        index,
        enterprise: enterprise as i64,
        name: field.name.clone(),
    })?;

    let length = match field.length {
        Some(length) => length,
        None if matches!(element.ty, IeType::String | IeType::OctetArray) => VARIABLE_LENGTH,
        None => element.natural_length(),
    };
    if length == 0 {
        return Err(ConfigError::InvalidCatalogFieldLength {
            template_id,
            index,
            length: length as u32,
        });
    }
    Ok(FieldSpecifier::new(enterprise, element.id, length))
}

fn resolve_enterprise_alias(alias: &str) -> Result<u32, ConfigError> {
    if alias == IANA_ALIAS {
        return Ok(ie::IANA);
    }
    alias.parse().map_err(|_| ConfigError::UnknownAlias(alias.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObservationDomain;

    #[test]
    fn loads_an_iana_only_catalog_and_injects_it() {
        let json = r#"{
            "256": {
                "fields": [
                    {"name": "sourceIPv4Address", "enterprise": "IANA", "length": 4},
                    {"name": "destinationIPv4Address", "enterprise": "IANA", "length": 4}
                ]
            }
        }"#;
        let catalog = TemplatesCatalog::from_json(json).unwrap();
        assert_eq!(catalog.template_ids(), vec![256]);

        let domain = ObservationDomain::new(1);
        catalog.inject_into(&domain, None, true).unwrap();
        assert_eq!(domain.egress_templates().len(), 1);
    }

    fn one_template_catalog() -> TemplatesCatalog {
        let json = r#"{
            "256": {
                "fields": [
                    {"name": "sourceIPv4Address", "enterprise": "IANA", "length": 4}
                ]
            }
        }"#;
        TemplatesCatalog::from_json(json).unwrap()
    }

    #[test]
    fn inject_all_installs_into_every_known_exporter_domain_and_refreshes() {
        use crate::exporter::{Exporter, ExporterConfig};
        use crate::session::Session;
        use std::net::{IpAddr, Ipv4Addr};
        use std::sync::Arc;
        use std::time::Duration;

        let catalog = one_template_catalog();
        let session = Arc::new(Session::new(|_, _, _| {}));
        session.domain(1); // pre-register so inject_all(domain_id=None) reaches it

        let mut exporter = Exporter::new(
            session.clone(),
            ExporterConfig {
                local_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                server_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                server_port: 4739,
                template_refresh_interval: Duration::from_secs(3600),
            },
        );
        exporter.start().unwrap();

        catalog
            .inject_all(CatalogTarget::Exporter(&exporter), None, None, true)
            .unwrap();
        assert_eq!(session.domain(1).egress_templates().len(), 1);
        exporter.stop();
    }

    #[test]
    fn inject_all_rejects_refresh_against_a_collector() {
        use crate::collector::{Collector, CollectorConfig};
        use crate::session::Session;
        use std::net::{IpAddr, Ipv4Addr};
        use std::sync::Arc;

        let catalog = one_template_catalog();
        let session = Arc::new(Session::new(|_, _, _| {}));
        let collector = Collector::new(
            session,
            CollectorConfig {
                listen_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                listen_port: 0,
            },
        );
        let err = catalog
            .inject_all(CatalogTarget::Collector(&collector), Some(1), None, true)
            .unwrap_err();
        assert!(matches!(err, ConfigError::RefreshNotSupportedOnCollector));
    }

    #[test]
    fn inject_all_installs_ingest_templates_for_a_collector_without_refresh() {
        use crate::collector::{Collector, CollectorConfig};
        use crate::session::Session;
        use std::net::{IpAddr, Ipv4Addr};
        use std::sync::Arc;

        let catalog = one_template_catalog();
        let session = Arc::new(Session::new(|_, _, _| {}));
        let collector = Collector::new(
            session.clone(),
            CollectorConfig {
                listen_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                listen_port: 0,
            },
        );
        catalog
            .inject_all(CatalogTarget::Collector(&collector), Some(1), None, false)
            .unwrap();
        assert!(session.domain(1).lookup_ingest_template(256).is_some());
    }

    #[test]
    fn rejects_unknown_enterprise_alias() {
        let json = r#"{"256": {"fields": [{"name": "x", "enterprise": "bogus"}]}}"#;
        assert!(TemplatesCatalog::from_json(json).is_err());
    }

    #[test]
    fn rejects_template_id_below_minimum() {
        let json = r#"{"10": {"fields": [{"name": "sourceIPv4Address", "enterprise": "IANA"}]}}"#;
        assert!(TemplatesCatalog::from_json(json).is_err());
    }
}

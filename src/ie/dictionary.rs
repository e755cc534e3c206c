//! Process-wide information element dictionary.
//!
//! Built once from a static table of IANA information elements (a
//! representative cross-section, not the full registry) behind a
//! [`std::sync::OnceLock`]. Callers may [`Dictionary::register`] additional
//! entries, including private-enterprise ones, at any point; the dictionary
//! itself never needs to be "finished" before use.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use super::{Constraint, IeType, InformationElement, IANA};

pub struct Dictionary {
    by_id: RwLock<HashMap<(u32, u16), InformationElement>>,
    by_name: RwLock<HashMap<(u32, String), u16>>,
}

impl Dictionary {
    fn with_defaults() -> Self {
        let dict = Dictionary {
            by_id: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
        };
        for ie in default_iana_elements() {
            dict.register(ie);
        }
        dict
    }

    /// Registers (or replaces) an information element in the dictionary.
    pub fn register(&self, ie: InformationElement) {
        let key = (ie.enterprise, ie.id);
        let name_key = (ie.enterprise, ie.name.to_string());
        self.by_name.write().unwrap().insert(name_key, ie.id);
        self.by_id.write().unwrap().insert(key, ie);
    }

    pub fn lookup_iana_by_id(&self, id: u16) -> Option<InformationElement> {
        self.lookup_pen_by_id(IANA, id)
    }

    pub fn lookup_iana_by_name(&self, name: &str) -> Option<InformationElement> {
        self.lookup_pen_by_name(IANA, name)
    }

    pub fn lookup_pen_by_id(&self, pen: u32, id: u16) -> Option<InformationElement> {
        self.by_id.read().unwrap().get(&(pen, id)).cloned()
    }

    pub fn lookup_pen_by_name(&self, pen: u32, name: &str) -> Option<InformationElement> {
        let id = *self.by_name.read().unwrap().get(&(pen, name.to_string()))?;
        self.lookup_pen_by_id(pen, id)
    }

    /// A PEN is considered valid once at least one IE has been registered
    /// under it (IANA, pen 0, is always valid).
    pub fn is_pen_valid(&self, pen: u32) -> bool {
        if pen == IANA {
            return true;
        }
        self.by_id.read().unwrap().keys().any(|(p, _)| *p == pen)
    }
}

static GLOBAL: OnceLock<Dictionary> = OnceLock::new();

/// Returns the process-wide dictionary, building it on first access.
pub fn global() -> &'static Dictionary {
    GLOBAL.get_or_init(Dictionary::with_defaults)
}

fn default_iana_elements() -> Vec<InformationElement> {
    use IeType::*;
    vec![
        InformationElement::new(IANA, 1, "octetDeltaCount", Unsigned64),
        InformationElement::new(IANA, 2, "packetDeltaCount", Unsigned64),
        InformationElement::new(IANA, 4, "protocolIdentifier", Unsigned8),
        InformationElement::new(IANA, 5, "ipClassOfService", Unsigned8),
        InformationElement::new(IANA, 6, "tcpControlBits", Unsigned8),
        InformationElement::new(IANA, 7, "sourceTransportPort", Unsigned16),
        InformationElement::new(IANA, 8, "sourceIPv4Address", Ipv4Address),
        InformationElement::new(IANA, 9, "sourceIPv4PrefixLength", Unsigned8),
        InformationElement::new(IANA, 10, "ingressInterface", Unsigned32),
        InformationElement::new(IANA, 11, "destinationTransportPort", Unsigned16),
        InformationElement::new(IANA, 12, "destinationIPv4Address", Ipv4Address),
        InformationElement::new(IANA, 13, "destinationIPv4PrefixLength", Unsigned8),
        InformationElement::new(IANA, 14, "egressInterface", Unsigned32),
        InformationElement::new(IANA, 15, "ipNextHopIPv4Address", Ipv4Address),
        InformationElement::new(IANA, 16, "bgpSourceAsNumber", Unsigned32),
        InformationElement::new(IANA, 17, "bgpDestinationAsNumber", Unsigned32),
        InformationElement::new(IANA, 24, "postPacketDeltaCount", Unsigned64),
        InformationElement::new(IANA, 25, "postOctetDeltaCount", Unsigned64),
        InformationElement::new(IANA, 27, "sourceIPv6Address", Ipv6Address),
        InformationElement::new(IANA, 28, "destinationIPv6Address", Ipv6Address),
        InformationElement::new(IANA, 32, "icmpTypeCodeIPv4", Unsigned16),
        InformationElement::new(IANA, 52, "minimumTTL", Unsigned8),
        InformationElement::new(IANA, 53, "maximumTTL", Unsigned8),
        InformationElement::new(IANA, 56, "sourceMacAddress", MacAddress),
        InformationElement::new(IANA, 58, "vlanId", Unsigned16),
        InformationElement::new(IANA, 60, "ipVersion", Unsigned8),
        InformationElement::new(IANA, 61, "flowDirection", Unsigned8)
            .with_constraint(Constraint {
                min: None,
                max: None,
                choices: Some(vec![0, 1]),
            }),
        InformationElement::new(IANA, 82, "interfaceName", String),
        InformationElement::new(IANA, 100, "enterpriseTestElement", Unsigned32),
        InformationElement::new(IANA, 150, "flowStartSeconds", DateTimeSeconds),
        InformationElement::new(IANA, 151, "flowEndSeconds", DateTimeSeconds),
        InformationElement::new(IANA, 152, "flowStartMilliseconds", DateTimeMilliseconds),
        InformationElement::new(IANA, 153, "flowEndMilliseconds", DateTimeMilliseconds),
        InformationElement::new(IANA, 210, "paddingOctets", OctetArray),
        InformationElement::new(IANA, 291, "basicList", BasicList),
        InformationElement::new(IANA, 292, "subTemplateList", SubTemplateList),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id_and_name_agree() {
        let dict = global();
        let by_id = dict.lookup_iana_by_id(1).unwrap();
        let by_name = dict.lookup_iana_by_name("octetDeltaCount").unwrap();
        assert_eq!(by_id.id, by_name.id);
        assert_eq!(by_id.name, "octetDeltaCount");
    }

    #[test]
    fn unknown_ie_is_none() {
        let dict = global();
        assert!(dict.lookup_iana_by_id(65000).is_none());
    }

    #[test]
    fn iana_pen_always_valid() {
        assert!(global().is_pen_valid(IANA));
    }

    #[test]
    fn register_adds_private_enterprise_entry() {
        let dict = global();
        dict.register(InformationElement::new(9, 100, "testPenElement", IeType::Unsigned32));
        assert!(dict.is_pen_valid(9));
        let ie = dict.lookup_pen_by_id(9, 100).unwrap();
        assert_eq!(ie.name, "testPenElement");
        let by_name = dict.lookup_pen_by_name(9, "testPenElement").unwrap();
        assert_eq!(by_name.id, 100);
    }
}

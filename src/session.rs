//! Session (§4.10): dispatches decoded messages over observation domains,
//! created on first reference, and invokes the user's `on_message` callback.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::domain::ObservationDomain;
use crate::error::CodecResult;
use crate::message::Message;
use crate::structured::DEFAULT_MAX_DEPTH;

pub type OnMessage = dyn Fn(&ObservationDomain, &Message, SocketAddr) + Send + Sync;

/// A set of observation domains keyed by domain id, with a single
/// `on_message` callback fired after template installation on receipt.
pub struct Session {
    domains: Mutex<HashMap<u32, Arc<ObservationDomain>>>,
    max_nesting_depth: usize,
    on_message: Box<OnMessage>,
}

impl Session {
    pub fn new<F>(on_message: F) -> Self
    where
        F: Fn(&ObservationDomain, &Message, SocketAddr) + Send + Sync + 'static,
    {
        Session {
            domains: Mutex::new(HashMap::new()),
            max_nesting_depth: DEFAULT_MAX_DEPTH,
            on_message: Box::new(on_message),
        }
    }

    pub fn with_max_nesting_depth(mut self, max_nesting_depth: usize) -> Self {
        self.max_nesting_depth = max_nesting_depth;
        self
    }

    /// Returns the domain for `domain_id`, creating it on first reference.
    pub fn domain(&self, domain_id: u32) -> Arc<ObservationDomain> {
        self.domains
            .lock()
            .unwrap()
            .entry(domain_id)
            .or_insert_with(|| Arc::new(ObservationDomain::new(domain_id)))
            .clone()
    }

    /// Decodes one datagram's worth of bytes as a `Message`, routes its
    /// template/option-template sets through the domain's ingest tables
    /// (already done as a side effect of decoding), then fires `on_message`.
    /// A panic inside the callback is caught and logged, never propagated.
    pub fn read_message(&self, buf: &[u8], peer: SocketAddr) -> CodecResult<Message> {
        let header = Message::read_header(buf)?;
        let domain = self.domain(header.observation_domain_id);
        let message = Message::decode_body(buf, &header, &domain, self.max_nesting_depth)?;

        let callback_result = panic::catch_unwind(AssertUnwindSafe(|| {
            (self.on_message)(&domain, &message, peer)
        }));
        if callback_result.is_err() {
            log::error!(
                "on_message callback panicked for domain {} (peer {})",
                domain.domain_id,
                peer
            );
        }
        Ok(message)
    }

    /// Encodes `message` against the named domain's egress sequencer.
    pub fn write_message(&self, mut message: Message, now_unix_seconds: u32) -> CodecResult<Vec<u8>> {
        let domain = self.domain(message.observation_domain_id);
        message.encode(&domain, now_unix_seconds)
    }

    /// Ids of every domain referenced so far in this session.
    pub fn domain_ids(&self) -> Vec<u32> {
        self.domains.lock().unwrap().keys().copied().collect()
    }

    /// Resets every known domain's egress sequencer, as required when an
    /// exporter is reconfigured to point at a different collector (§6).
    pub fn reset_all_egress_sequencers(&self) {
        for domain in self.domains.lock().unwrap().values() {
            domain.reset_egress_sequencer();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_specifier::FieldSpecifier;
    use crate::set::Set;
    use crate::template::TemplateRecord;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn callback_fires_once_per_message() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let session = Session::new(move |_domain, _message, _peer| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let template = TemplateRecord::new(256, vec![FieldSpecifier::new(0, 1, 8)]).unwrap();
        let mut message = Message::new(1, vec![Set::template_set(vec![template])]);
        let encode_domain = session.domain(1);
        let bytes = message.encode(&encode_domain, 0).unwrap();

        let peer = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4739);
        session.read_message(&bytes, peer).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_panic_is_caught_and_does_not_propagate() {
        let session = Session::new(|_domain, _message, _peer| panic!("boom"));
        let template = TemplateRecord::new(256, vec![FieldSpecifier::new(0, 1, 8)]).unwrap();
        let mut message = Message::new(1, vec![Set::template_set(vec![template])]);
        let encode_domain = session.domain(1);
        let bytes = message.encode(&encode_domain, 0).unwrap();

        let peer = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4739);
        let result = session.read_message(&bytes, peer);
        assert!(result.is_ok());
    }
}

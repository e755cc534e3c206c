//! Message (§4.8): the versioned envelope of sets, with header encode/decode
//! and the per-domain `Sequencer` bookkeeping it drives.

use crate::domain::ObservationDomain;
use crate::error::{CodecError, CodecResult};
use crate::set::Set;

pub const VERSION: u16 = 10;
pub const HEADER_LEN: usize = 16;

/// The 16-octet message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub length: u16,
    pub export_time: u32,
    pub sequence_number: u32,
    pub observation_domain_id: u32,
}

impl Header {
    pub fn read(buf: &[u8]) -> CodecResult<Self> {
        if buf.len() < HEADER_LEN {
            return Err(CodecError::ShortRead {
                needed: HEADER_LEN,
                available: buf.len(),
            });
        }
        let version = u16::from_be_bytes([buf[0], buf[1]]);
        if version != VERSION {
            return Err(CodecError::InvalidVersion(version));
        }
        let length = u16::from_be_bytes([buf[2], buf[3]]);
        if length == 0 {
            return Err(CodecError::InvalidLength(0));
        }
        let export_time = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let sequence_number = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let observation_domain_id = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
        Ok(Header {
            version,
            length,
            export_time,
            sequence_number,
            observation_domain_id,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&self.length.to_be_bytes());
        out.extend_from_slice(&self.export_time.to_be_bytes());
        out.extend_from_slice(&self.sequence_number.to_be_bytes());
        out.extend_from_slice(&self.observation_domain_id.to_be_bytes());
    }
}

/// A decoded or to-be-encoded IPFIX message. `export_time`/`sequence_number`
/// are `None` until resolved by [`Message::encode`] or a prior decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub export_time: Option<u32>,
    pub sequence_number: Option<u32>,
    pub observation_domain_id: u32,
    pub sets: Vec<Set>,
}

impl Message {
    pub fn new(observation_domain_id: u32, sets: Vec<Set>) -> Self {
        Message {
            export_time: None,
            sequence_number: None,
            observation_domain_id,
            sets,
        }
    }

    pub fn data_record_count(&self) -> u32 {
        self.sets.iter().map(|s| s.data_record_count() as u32).sum()
    }

    /// Parses only the fixed header (16 octets); does not touch a domain.
    pub fn read_header(buf: &[u8]) -> CodecResult<Header> {
        Header::read(buf)
    }

    /// Decodes the message body (all sets) once its domain is known,
    /// installing templates and advancing the domain's ingest sequencer.
    pub fn decode_body(buf: &[u8], header: &Header, domain: &ObservationDomain, max_depth: usize) -> CodecResult<Self> {
        let mut offset = HEADER_LEN;
        let length = header.length as usize;
        if buf.len() < length {
            return Err(CodecError::ShortRead {
                needed: length,
                available: buf.len(),
            });
        }
        let mut sets = Vec::new();
        while offset < length {
            let (set, consumed) = Set::read(&buf[offset..length], domain, max_depth)?;
            offset += consumed;
            sets.push(set);
        }
        let data_records = sets.iter().map(|s| s.data_record_count() as u32).sum();
        domain
            .ingest_sequencer
            .lock()
            .unwrap()
            .update(data_records, header.export_time);
        Ok(Message {
            export_time: Some(header.export_time),
            sequence_number: Some(header.sequence_number),
            observation_domain_id: header.observation_domain_id,
            sets,
        })
    }

    /// Encodes this message, resolving an unset sequence number from
    /// `domain`'s egress sequencer and an unset export time from `now`, then
    /// advances that sequencer by this message's data record count (§4.8).
    pub fn encode(&mut self, domain: &ObservationDomain, now_unix_seconds: u32) -> CodecResult<Vec<u8>> {
        let mut body = Vec::new();
        for set in &self.sets {
            set.write(&mut body)?;
        }

        let export_time = self.export_time.unwrap_or(now_unix_seconds);
        let data_records = self.data_record_count();
        let sequence_number = match self.sequence_number {
            Some(seq) => seq,
            None => domain.egress_sequencer.lock().unwrap().next_seq,
        };
        domain.egress_sequencer.lock().unwrap().update(data_records, export_time);

        self.export_time = Some(export_time);
        self.sequence_number = Some(sequence_number);

        let total_len = HEADER_LEN + body.len();
        let header = Header {
            version: VERSION,
            length: total_len as u16,
            export_time,
            sequence_number,
            observation_domain_id: self.observation_domain_id,
        };
        let mut out = Vec::with_capacity(total_len);
        header.write(&mut out);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

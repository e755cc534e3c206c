//! An IPFIX (RFC 7011) protocol engine: wire codec, per-domain template and
//! sequencing state, and UDP exporter/collector transports, with RFC 6313
//! structured data type support.

pub mod adapters;
pub mod catalog;
pub mod codec;
pub mod collector;
pub mod config;
pub mod domain;
pub mod error;
pub mod exporter;
pub mod field_specifier;
pub mod field_value;
pub mod ie;
pub mod message;
pub mod record;
pub mod session;
pub mod set;
pub mod structured;
pub mod template;

pub use domain::ObservationDomain;
pub use error::{CodecError, ConfigError, IpfixError, TransportError};
pub use message::Message;
pub use session::Session;

use std::io;

use thiserror::Error;

/// Errors raised while decoding or encoding the wire format: headers, sets,
/// templates, field specifiers, field values and the structured data types.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("short read: needed {needed} octets, had {available}")]
    ShortRead { needed: usize, available: usize },

    #[error("short buffer: needed {needed} octets, had {available}")]
    ShortBuffer { needed: usize, available: usize },

    #[error("invalid IPFIX version {0}, expected 10")]
    InvalidVersion(u16),

    #[error("invalid length {0}")]
    InvalidLength(u16),

    #[error("invalid set id {0}")]
    InvalidSetId(u16),

    #[error("invalid template id {0}, must be >= 256")]
    InvalidTemplateId(u16),

    #[error("invalid field count {0}, must be >= 1")]
    InvalidFieldCount(u16),

    #[error("invalid scope field count {scope} for field count {fields}")]
    InvalidScopeCount { scope: u16, fields: u16 },

    #[error("invalid list semantic 0x{0:02x}")]
    InvalidSemantic(u8),

    #[error("unknown information element (enterprise {enterprise}, id {id})")]
    UnknownIE { enterprise: u32, id: u16 },

    #[error("unknown template {template_id} in observation domain {domain_id}")]
    UnknownTemplate { domain_id: u32, template_id: u16 },

    #[error("unknown enterprise number {0}")]
    UnknownEnterprise(u32),

    #[error("value for {field} violates constraint: {detail}")]
    ConstraintViolation { field: String, detail: String },

    #[error("template id {template_id} collides with an existing {existing} template in domain {domain_id}")]
    TemplateIdCollision {
        domain_id: u32,
        template_id: u16,
        existing: &'static str,
    },

    #[error("subTemplateList recursion limit exceeded (max {limit})")]
    RecursionLimit { limit: usize },

    #[error("unknown type for length {length}")]
    UnknownType { length: u16 },

    #[error("length mismatch: type requires {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("value out of range for {field}")]
    ValueOutOfRange { field: String },
}

/// Errors raised by the transport layer (`Exporter`/`Collector` socket I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("socket I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("transport {0} is not supported, only \"udp\" is")]
    UnsupportedTransport(String),

    #[error("transport is not running")]
    NotRunning,
}

/// Errors raised validating exporter/collector configuration at configure time.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid port {0}, must be in 1..=65535")]
    InvalidPort(u32),

    #[error("invalid template refresh timeout {0}, must be in 1.0..=86400.0 seconds")]
    InvalidRefreshTimeout(f64),

    #[error("transport {0} is reserved and not implemented")]
    TransportReserved(String),

    #[error("unknown enterprise alias {0:?} in template catalog")]
    UnknownAlias(String),

    #[error("template {template_id} field {index} names unknown IE {name:?} for enterprise {enterprise}")]
    UnknownCatalogField {
        template_id: u16,
        index: usize,
        enterprise: i64,
        name: String,
    },

    #[error("template {template_id} field {index} has invalid length {length}")]
    InvalidCatalogFieldLength {
        template_id: u16,
        index: usize,
        length: u32,
    },

    #[error("template catalog is malformed: {0}")]
    MalformedCatalog(String),

    #[error("cannot refresh templates on a collector: templates only arrive over the wire")]
    RefreshNotSupportedOnCollector,
}

/// Top-level error type unifying the three failure domains above, for call
/// sites (such as `Session::read_message`) that can fail in more than one way.
#[derive(Error, Debug)]
pub enum IpfixError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type CodecResult<T> = Result<T, CodecError>;

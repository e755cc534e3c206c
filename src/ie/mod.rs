//! Information Element identity and the process-wide dictionary.
//!
//! An IE is identified by (enterprise number, element id); enterprise number
//! 0 denotes IANA. The dictionary is process-wide and immutable after init,
//! save for explicit registration of additional entries (see [`Dictionary::register`]).

pub mod dictionary;

use std::fmt;

pub use dictionary::{global, Dictionary};

/// IANA enterprise number sentinel: enterprise 0 always means IANA.
pub const IANA: u32 = 0;

/// Abstract type of an information element's value, per RFC 7012 §3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IeType {
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Float32,
    Float64,
    Boolean,
    MacAddress,
    String,
    OctetArray,
    Ipv4Address,
    Ipv6Address,
    DateTimeSeconds,
    DateTimeMilliseconds,
    DateTimeMicroseconds,
    DateTimeNanoseconds,
    BasicList,
    SubTemplateList,
}

impl IeType {
    /// Natural (maximum, full-precision) encoded length in octets for this type.
    /// Integer and dateTime types may be carried in fewer octets on the wire
    /// (reduced-size encoding, RFC 7011 §6.2); everything else is fixed.
    pub fn natural_length(self) -> u16 {
        match self {
            IeType::Unsigned8 | IeType::Signed8 | IeType::Boolean => 1,
            IeType::Unsigned16 | IeType::Signed16 => 2,
            IeType::Unsigned32 | IeType::Signed32 | IeType::Float32 | IeType::Ipv4Address => 4,
            IeType::Unsigned64
            | IeType::Signed64
            | IeType::Float64
            | IeType::DateTimeMilliseconds
            | IeType::DateTimeMicroseconds
            | IeType::DateTimeNanoseconds => 8,
            IeType::DateTimeSeconds => 4,
            IeType::MacAddress => 6,
            IeType::Ipv6Address => 16,
            // String and octetArray have no fixed natural length; a template
            // either fixes a concrete length or marks the field variable.
            IeType::String | IeType::OctetArray => 65535,
            IeType::BasicList | IeType::SubTemplateList => 65535,
        }
    }

    /// True for the integer/dateTime families that support reduced-size
    /// encoding (any length from 1 up to the natural width is legal).
    pub fn supports_reduced_size(self) -> bool {
        matches!(
            self,
            IeType::Unsigned8
                | IeType::Unsigned16
                | IeType::Unsigned32
                | IeType::Unsigned64
                | IeType::Signed8
                | IeType::Signed16
                | IeType::Signed32
                | IeType::Signed64
                | IeType::DateTimeSeconds
                | IeType::DateTimeMilliseconds
                | IeType::DateTimeMicroseconds
                | IeType::DateTimeNanoseconds
        )
    }

    /// True for the two RFC 6313 structured data types, which are always
    /// variable-length on the wire regardless of the field specifier's length.
    pub fn is_structured(self) -> bool {
        matches!(self, IeType::BasicList | IeType::SubTemplateList)
    }
}

/// A numeric value constraint attached to an information element: min/max
/// bounds and/or a closed set of legal values ("choose" per RFC 7012 §3.5).
#[derive(Debug, Clone, Default)]
pub struct Constraint {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub choices: Option<Vec<i64>>,
}

impl Constraint {
    pub fn check(&self, value: i64) -> Result<(), String> {
        if let Some(min) = self.min {
            if value < min {
                return Err(format!("{} < minimum {}", value, min));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(format!("{} > maximum {}", value, max));
            }
        }
        if let Some(choices) = &self.choices {
            if !choices.contains(&value) {
                return Err(format!("{} is not among the allowed values {:?}", value, choices));
            }
        }
        Ok(())
    }
}

/// A named, typed information element.
#[derive(Debug, Clone)]
pub struct InformationElement {
    pub enterprise: u32,
    pub id: u16,
    pub name: &'static str,
    pub ty: IeType,
    pub constraint: Option<Constraint>,
}

impl InformationElement {
    pub const fn new(enterprise: u32, id: u16, name: &'static str, ty: IeType) -> Self {
        InformationElement {
            enterprise,
            id,
            name,
            ty,
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn natural_length(&self) -> u16 {
        self.ty.natural_length()
    }
}

impl fmt::Display for InformationElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.enterprise == IANA {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.enterprise)
        }
    }
}

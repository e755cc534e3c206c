//! Per-IE value adapters (ambient, §4.15): an optional enrichment layer on
//! top of the core codec, parsing human-entered text into a `Value` and
//! applying an extra check beyond the IE's own `Constraint`.
//!
//! Keyed by IE identity (enterprise, id) rather than by field name string,
//! since names are not guaranteed unique across enterprises.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::codec::Value;
use crate::error::{CodecError, CodecResult};

pub type Parser = fn(&str) -> Result<Value, String>;
pub type Checker = fn(&Value) -> Result<(), String>;

#[derive(Clone, Copy)]
pub struct Adapter {
    pub parse: Parser,
    pub check: Checker,
}

/// Registry of adapters keyed by (enterprise, id). Empty by default; callers
/// register adapters for the fields they intend to accept as text input.
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<(u32, u16), Adapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        AdapterRegistry {
            adapters: RwLock::new(HashMap::new()),
        }
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, enterprise: u32, id: u16, adapter: Adapter) {
        self.adapters.write().unwrap().insert((enterprise, id), adapter);
    }

    /// Parses and checks `text` against the adapter registered for
    /// (enterprise, id). Falls through to `ConstraintViolation` if no
    /// adapter is registered, since the caller has nothing to parse with.
    pub fn process(&self, enterprise: u32, id: u16, text: &str) -> CodecResult<Value> {
        let adapter = self
            .adapters
            .read()
            .unwrap()
            .get(&(enterprise, id))
            .copied()
            .ok_or(CodecError::UnknownIE { enterprise, id })?;

        let value = (adapter.parse)(text).map_err(|detail| CodecError::ConstraintViolation {
            field: format!("{}/{}", enterprise, id),
            detail,
        })?;
        (adapter.check)(&value).map_err(|detail| CodecError::ConstraintViolation {
            field: format!("{}/{}", enterprise, id),
            detail,
        })?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_flow_direction(text: &str) -> Result<Value, String> {
        match text {
            "ingress" => Ok(Value::Unsigned(0)),
            "egress" => Ok(Value::Unsigned(1)),
            other => Err(format!("unknown flowDirection {:?}", other)),
        }
    }

    fn check_flow_direction(value: &Value) -> Result<(), String> {
        match value {
            Value::Unsigned(0) | Value::Unsigned(1) => Ok(()),
            other => Err(format!("{:?} is not 0 or 1", other)),
        }
    }

    #[test]
    fn registered_adapter_parses_and_checks() {
        let registry = AdapterRegistry::new();
        registry.register(
            0,
            61,
            Adapter {
                parse: parse_flow_direction,
                check: check_flow_direction,
            },
        );
        let value = registry.process(0, 61, "egress").unwrap();
        assert_eq!(value, Value::Unsigned(1));
    }

    #[test]
    fn unregistered_field_is_an_error() {
        let registry = AdapterRegistry::new();
        assert!(registry.process(0, 999, "whatever").is_err());
    }

    #[test]
    fn parser_rejecting_input_surfaces_as_constraint_violation() {
        let registry = AdapterRegistry::new();
        registry.register(
            0,
            61,
            Adapter {
                parse: parse_flow_direction,
                check: check_flow_direction,
            },
        );
        assert!(registry.process(0, 61, "sideways").is_err());
    }
}

//! Namespaced extension attributes
//!
//! Document keys of the form `prefix:attribute` that no typed field consumes
//! are kept verbatim so a schema can be written back out unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Scalar value of an extension attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Convert a document value, if it is a scalar
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Boolean(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Scalar::Integer)
                .or_else(|| n.as_f64().map(Scalar::Float)),
            Value::String(s) => Some(Scalar::String(s.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Extension attributes keyed by their full `prefix:attribute` name
pub type ExtensionMap = BTreeMap<String, Scalar>;

/// Whether a document key belongs to an extension namespace
pub fn is_namespaced(key: &str) -> bool {
    !key.starts_with('@')
        && key
            .split_once(':')
            .is_some_and(|(prefix, attr)| !prefix.is_empty() && !attr.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_from_value() {
        assert_eq!(Scalar::from_value(&json!(3)), Some(Scalar::Integer(3)));
        assert_eq!(Scalar::from_value(&json!(1.5)), Some(Scalar::Float(1.5)));
        assert_eq!(
            Scalar::from_value(&json!("deg")),
            Some(Scalar::String("deg".to_string()))
        );
        assert_eq!(Scalar::from_value(&json!(["a"])), None);
        assert_eq!(Scalar::from_value(&json!({"a": 1})), None);
    }

    #[test]
    fn test_is_namespaced() {
        assert!(is_namespaced("ivoa:ucd"));
        assert!(is_namespaced("lsst:unit"));
        assert!(!is_namespaced("@id"));
        assert!(!is_namespaced("description"));
        assert!(!is_namespaced(":x"));
    }
}

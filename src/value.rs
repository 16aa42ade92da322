//! Leaf values
//!
//! [`Value`] is the scalar union stored in value leaves, leaf-lists and list
//! keys. Besides plain scalars it carries one structural variant:
//! [`Value::Ref`], a reference to another node in the tree. References cannot
//! be written verbatim into every context (freshly appended leaf-list entries
//! in particular), so [`Value::to_portable`] converts them to their canonical
//! path-string form.
//!
//! Values deserialize from plain YAML scalars, which is how schema documents
//! declare leaf defaults.

use crate::path::KeyPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar or reference value held by a leaf
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    /// A structural reference: a keypath into the store
    Ref(KeyPath),
}

impl Value {
    /// Human-readable type name, for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::Ref(_) => "reference",
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    /// Convert to a form that survives being written anywhere: references
    /// become their canonical path string, scalars pass through unchanged.
    pub fn to_portable(&self) -> Value {
        match self {
            Value::Ref(path) => Value::String(path.to_string()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{}", s),
            Value::Ref(path) => write!(f, "{}", path),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::from("alpha").to_string(), "alpha");
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from(true).to_string(), "true");
        let path = KeyPath::root().child("a").child("b");
        assert_eq!(Value::Ref(path).to_string(), "/a/b");
    }

    #[test]
    fn test_to_portable_converts_only_refs() {
        let path = KeyPath::root().entry("endpoint", vec![Value::from("east")]);
        let reference = Value::Ref(path);
        assert_eq!(
            reference.to_portable(),
            Value::String("/endpoint{east}".to_string())
        );

        let scalar = Value::from(7);
        assert_eq!(scalar.to_portable(), scalar);
        assert!(!scalar.is_ref());
        assert!(reference.is_ref());
    }

    #[test]
    fn test_deserialize_from_yaml_scalars() {
        let v: Value = serde_yaml::from_str("22").unwrap();
        assert_eq!(v, Value::Int(22));
        let v: Value = serde_yaml::from_str("\"22\"").unwrap();
        assert_eq!(v, Value::String("22".to_string()));
        let v: Value = serde_yaml::from_str("true").unwrap();
        assert_eq!(v, Value::Bool(true));
        let v: Value = serde_yaml::from_str("managed").unwrap();
        assert_eq!(v, Value::String("managed".to_string()));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::from(1).type_name(), "int");
        assert_eq!(Value::Ref(KeyPath::root()).type_name(), "reference");
    }
}

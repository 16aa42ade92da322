//! Keypath model for addressing nodes in the configuration tree
//!
//! A [`KeyPath`] identifies one node instance relative to the tree root. It
//! renders in the canonical form used throughout error messages and
//! reference-value encoding:
//!
//! ```text
//! /service/endpoint{east 8080}/tags
//! ```
//!
//! List entries are addressed by their ordered key values in braces. Choice
//! and case schema nodes never appear in a keypath; their children are
//! addressed directly under the enclosing container.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step in a keypath
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    /// A named child node (container, leaf, list, ...)
    Child(String),
    /// A list entry selected by its ordered key-value tuple
    Entry { name: String, keys: Vec<Value> },
}

/// A path from the tree root to one node instance
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPath {
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// The root path, rendered as `/`
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Extend with a named child segment
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Child(name.to_string()));
        Self { segments }
    }

    /// Extend with a list entry segment
    pub fn entry(&self, name: &str, keys: Vec<Value>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Entry {
            name: name.to_string(),
            keys,
        });
        Self { segments }
    }

    /// The path one level up; the root is its own parent
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            match segment {
                PathSegment::Child(name) => write!(f, "/{}", name)?,
                PathSegment::Entry { name, keys } => {
                    write!(f, "/{}{{", name)?;
                    for (i, key) in keys.iter().enumerate() {
                        if i > 0 {
                            write!(f, " ")?;
                        }
                        write_key(f, key)?;
                    }
                    write!(f, "}}")?;
                }
            }
        }
        Ok(())
    }
}

/// Render one key value inside an entry segment, quoting strings that would
/// be ambiguous in the `{k1 k2}` form.
fn write_key(f: &mut fmt::Formatter<'_>, key: &Value) -> fmt::Result {
    match key {
        Value::String(s) if s.is_empty() || s.contains([' ', '{', '}']) => {
            write!(f, "\"{}\"", s)
        }
        other => write!(f, "{}", other),
    }
}

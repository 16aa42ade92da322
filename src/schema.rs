//! # Schema Model and Parsing
//!
//! A schema describes the shape of a configuration tree: which children each
//! node declares, in which order, of which structural kind, in which
//! namespace, with which defaults and list keys. Schemas are written as YAML
//! documents and parsed into an immutable, namespace-resolved tree that the
//! store and the copy algorithm consult at runtime.
//!
//! ## Schema documents
//!
//! ```yaml
//! name: service
//! namespace: srv
//! kind: container
//! children:
//!   - name: endpoint
//!     kind: list
//!     keys: [name]
//!     children:
//!       - name: name
//!         kind: leaf
//!       - name: port
//!         kind: leaf
//!         default: 22
//! ```
//!
//! `namespace` is inherited from the parent when omitted; an augmented
//! subtree grafted in from another module overrides it. `default` is only
//! valid on `leaf`, `keys` only on `list` (and every key must name a declared
//! leaf child).
//!
//! ## Choice and case
//!
//! `choice` nodes declare `case` children, and case children are addressed
//! directly under the enclosing container — neither choice nor case occupies
//! a level in the data tree. [`SchemaNode::visible_children`] reflects this:
//! it yields each declared child in order, and for a choice it yields the
//! choice node itself (so callers can observe it) followed by the flattened
//! children of all its cases.
//!
//! `list-element` is a runtime classification, not a declarable kind: a
//! `list` schema node addressed through an entry segment classifies as a
//! list element.

use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Structural kind of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Non-repeating grouping node, exists whenever any descendant does
    Container,
    /// Container with an independent existence flag
    PresenceContainer,
    /// Repeating, optionally keyed collection
    List,
    /// One member of a list (runtime classification only)
    ListElement,
    /// Ordered collection of scalar or reference values under one name
    LeafList,
    /// Scalar-valued leaf; may be unset and serve its declared default
    Leaf,
    /// Existence-only leaf, no value
    EmptyLeaf,
    /// Tagged alternative; at most one case populated at a time
    Choice,
    /// One named alternative branch of a choice
    Case,
    /// Grouping of invocation parameters (e.g. action input/output)
    ParameterSet,
    /// Invocable node; never carries copied data
    Action,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Container => "container",
            NodeKind::PresenceContainer => "presence-container",
            NodeKind::List => "list",
            NodeKind::ListElement => "list-element",
            NodeKind::LeafList => "leaf-list",
            NodeKind::Leaf => "leaf",
            NodeKind::EmptyLeaf => "empty-leaf",
            NodeKind::Choice => "choice",
            NodeKind::Case => "case",
            NodeKind::ParameterSet => "parameter-set",
            NodeKind::Action => "action",
        };
        write!(f, "{}", name)
    }
}

/// Raw deserialization shape of one schema node, before validation and
/// namespace resolution.
#[derive(Debug, Deserialize)]
struct RawSchemaNode {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    kind: NodeKind,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    children: Vec<RawSchemaNode>,
}

/// One validated schema node: declared name, owning namespace, structural
/// kind, declared default, list keys and declared children in order.
#[derive(Debug)]
pub struct SchemaNode {
    name: String,
    namespace: String,
    kind: NodeKind,
    default: Option<Value>,
    keys: Vec<String>,
    is_key: bool,
    children: Vec<Rc<SchemaNode>>,
}

impl SchemaNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Declared default value, if any (leaves only)
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Ordered key leaf names (lists only; empty for unkeyed lists)
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Whether this leaf is one of its parent list's keys
    pub fn is_key(&self) -> bool {
        self.is_key
    }

    /// Declared children, in declaration order, without choice flattening
    pub fn children(&self) -> &[Rc<SchemaNode>] {
        &self.children
    }

    /// The name a sibling module would use to address this node from a
    /// parent in `parent_namespace`: qualified as `ns:name` when the
    /// namespaces differ, bare otherwise.
    pub fn qualified_name(&self, parent_namespace: &str) -> String {
        if self.namespace == parent_namespace {
            self.name.clone()
        } else {
            format!("{}:{}", self.namespace, self.name)
        }
    }

    /// Declaration-order children as addressable at runtime: choice nodes
    /// are included (so callers can classify them), case nodes are not, and
    /// every case's children are promoted to this level.
    pub fn visible_children(&self) -> Vec<Rc<SchemaNode>> {
        let mut out = Vec::new();
        collect_visible(&self.children, &mut out);
        out
    }

    /// Find an addressable child by bare (`name`) or qualified (`ns:name`)
    /// name, looking through choice/case levels.
    pub fn find_child(&self, name: &str) -> Option<Rc<SchemaNode>> {
        let (namespace, local) = match name.split_once(':') {
            Some((ns, local)) => (Some(ns), local),
            None => (None, name),
        };
        self.visible_children().into_iter().find(|child| {
            child.name == local && namespace.is_none_or(|ns| child.namespace == ns)
        })
    }
}

fn collect_visible(children: &[Rc<SchemaNode>], out: &mut Vec<Rc<SchemaNode>>) {
    for child in children {
        out.push(child.clone());
        if child.kind == NodeKind::Choice {
            for case in child.children() {
                collect_visible(case.children(), out);
            }
        }
    }
}

/// A parsed, validated schema module
#[derive(Clone, Debug)]
pub struct Schema {
    root: Rc<SchemaNode>,
}

impl Schema {
    /// Parse and validate a YAML schema document.
    ///
    /// The root node must declare a namespace and be container-shaped.
    pub fn from_yaml(text: &str) -> Result<Schema> {
        let raw: RawSchemaNode = serde_yaml::from_str(text)?;
        let namespace = raw.namespace.clone().ok_or_else(|| Error::Schema {
            message: format!("root node '{}' must declare a namespace", raw.name),
        })?;
        if !matches!(raw.kind, NodeKind::Container | NodeKind::PresenceContainer) {
            return Err(Error::Schema {
                message: format!(
                    "root node '{}' must be a container, not {}",
                    raw.name, raw.kind
                ),
            });
        }
        let root = build_node(raw, &namespace, false)?;
        Ok(Schema { root })
    }

    pub fn root(&self) -> Rc<SchemaNode> {
        self.root.clone()
    }
}

fn build_node(raw: RawSchemaNode, parent_namespace: &str, is_key: bool) -> Result<Rc<SchemaNode>> {
    let namespace = raw
        .namespace
        .unwrap_or_else(|| parent_namespace.to_string());

    if raw.kind == NodeKind::ListElement {
        return Err(Error::Schema {
            message: format!(
                "node '{}': list-element is a runtime classification, declare a list instead",
                raw.name
            ),
        });
    }
    if raw.default.is_some() && raw.kind != NodeKind::Leaf {
        return Err(Error::Schema {
            message: format!("{} '{}' cannot declare a default", raw.kind, raw.name),
        });
    }
    if !raw.keys.is_empty() && raw.kind != NodeKind::List {
        return Err(Error::Schema {
            message: format!("{} '{}' cannot declare keys", raw.kind, raw.name),
        });
    }
    match raw.kind {
        NodeKind::Leaf | NodeKind::EmptyLeaf | NodeKind::LeafList => {
            if !raw.children.is_empty() {
                return Err(Error::Schema {
                    message: format!("{} '{}' cannot have children", raw.kind, raw.name),
                });
            }
        }
        NodeKind::Choice => {
            if let Some(bad) = raw.children.iter().find(|c| c.kind != NodeKind::Case) {
                return Err(Error::Schema {
                    message: format!(
                        "choice '{}' child '{}' must be a case, not {}",
                        raw.name, bad.name, bad.kind
                    ),
                });
            }
        }
        _ => {
            if let Some(bad) = raw.children.iter().find(|c| c.kind == NodeKind::Case) {
                return Err(Error::Schema {
                    message: format!(
                        "case '{}' must be declared under a choice, not under {} '{}'",
                        bad.name, raw.kind, raw.name
                    ),
                });
            }
        }
    }
    if raw.kind == NodeKind::List {
        for key in &raw.keys {
            match raw.children.iter().find(|c| &c.name == key) {
                Some(child) if child.kind == NodeKind::Leaf => {}
                Some(child) => {
                    return Err(Error::Schema {
                        message: format!(
                            "list '{}' key '{}' must be a leaf, not {}",
                            raw.name, key, child.kind
                        ),
                    });
                }
                None => {
                    return Err(Error::Schema {
                        message: format!("list '{}' names unknown key '{}'", raw.name, key),
                    });
                }
            }
        }
    }

    let keys = raw.keys;
    let child_is_key =
        |child: &RawSchemaNode| raw.kind == NodeKind::List && keys.contains(&child.name);

    let mut children = Vec::with_capacity(raw.children.len());
    for child in raw.children {
        let key = child_is_key(&child);
        children.push(build_node(child, &namespace, key)?);
    }

    Ok(Rc::new(SchemaNode {
        name: raw.name,
        namespace,
        kind: raw.kind,
        default: raw.default,
        keys,
        is_key,
        children,
    }))
}

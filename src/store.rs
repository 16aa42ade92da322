//! # In-Memory Configuration Store
//!
//! A transactional, schema-typed data tree. The store holds instance data
//! shaped by a [`Schema`](crate::schema::Schema); all reads and writes go
//! through [`Node`] handles obtained from a [`Transaction`].
//!
//! ## Model
//!
//! - [`Store`] owns the schema and the shared data tree.
//! - [`Transaction`] is a cheap, cloneable view over the data. A
//!   [`Transaction::suppressed_defaults_view`] makes "leaf is unset and
//!   serving its schema default" observable through
//!   [`Node::tagged_value`] — without it, a defaulted leaf is
//!   indistinguishable from one explicitly set to the same value.
//! - [`Node`] is a transient handle: a keypath plus its schema node, bound
//!   to the transaction it was obtained from. Handles from different
//!   transactions are only mixed by re-resolving a keypath with
//!   [`Transaction::node_at`].
//!
//! Instance data is created on demand: writing a value materializes the
//! intermediate containers (and list entries) above it. Choice and case
//! schema levels are transparent — a case's children live directly under
//! the enclosing container in the data tree.
//!
//! The store is single-threaded by design (`Rc<RefCell<_>>`, no locking);
//! isolation across concurrent writers is out of scope.

use crate::error::{Error, Result};
use crate::path::{KeyPath, PathSegment};
use crate::schema::{NodeKind, Schema, SchemaNode};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Instance data for one node
#[derive(Clone, Debug, PartialEq)]
enum DataNode {
    /// Plain container, parameter set, or list entry body
    Branch(HashMap<String, DataNode>),
    /// Presence container: existence is a flag, not "has children"
    Presence {
        present: bool,
        children: HashMap<String, DataNode>,
    },
    /// Keyed (or unkeyed) list
    List(Vec<ListEntry>),
    /// Ordered leaf-list values
    LeafList(Vec<Value>),
    /// Value leaf; `None` means unset, serving the schema default
    Leaf(Option<Value>),
    /// Empty leaf: existence only
    Flag(bool),
}

#[derive(Clone, Debug, PartialEq)]
struct ListEntry {
    keys: Vec<Value>,
    body: DataNode,
}

/// A value read together with its explicit/default tag.
///
/// `is_default` is only ever `true` under a suppressed-defaults view; see
/// [`Node::tagged_value`].
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedValue {
    pub value: Value,
    pub is_default: bool,
}

/// Owns a schema and its instance data
pub struct Store {
    schema: Rc<SchemaNode>,
    data: Rc<RefCell<DataNode>>,
}

impl Store {
    pub fn new(schema: Schema) -> Store {
        Store {
            schema: schema.root(),
            data: Rc::new(RefCell::new(DataNode::Branch(HashMap::new()))),
        }
    }

    /// Open a read/write view over the store's data
    pub fn transaction(&self) -> Transaction {
        Transaction {
            schema: self.schema.clone(),
            data: self.data.clone(),
            suppress_defaults: false,
        }
    }
}

/// A session-scoped read/write context over the store
#[derive(Clone)]
pub struct Transaction {
    schema: Rc<SchemaNode>,
    data: Rc<RefCell<DataNode>>,
    suppress_defaults: bool,
}

impl Transaction {
    /// Handle on the tree root
    pub fn root(&self) -> Node {
        Node {
            txn: self.clone(),
            schema: self.schema.clone(),
            path: KeyPath::root(),
        }
    }

    /// A nested read view in which unset leaves report their defaults as
    /// defaults instead of masquerading as explicit values.
    pub fn suppressed_defaults_view(&self) -> Transaction {
        Transaction {
            schema: self.schema.clone(),
            data: self.data.clone(),
            suppress_defaults: true,
        }
    }

    pub fn suppresses_defaults(&self) -> bool {
        self.suppress_defaults
    }

    /// Re-resolve a keypath inside this transaction, yielding a handle
    /// equivalent to one obtained elsewhere.
    pub fn node_at(&self, path: &KeyPath) -> Result<Node> {
        let mut node = self.root();
        for segment in path.segments() {
            node = match segment {
                PathSegment::Child(name) => node.child(name)?,
                PathSegment::Entry { name, keys } => node.child(name)?.element(keys.clone())?,
            };
        }
        Ok(node)
    }
}

/// A transient, schema-typed handle on one position in the tree
#[derive(Clone)]
pub struct Node {
    txn: Transaction,
    schema: Rc<SchemaNode>,
    path: KeyPath,
}

impl Node {
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Declared (local) name
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn namespace(&self) -> &str {
        self.schema.namespace()
    }

    pub fn transaction(&self) -> &Transaction {
        &self.txn
    }

    /// Whether this leaf is one of its parent list's keys
    pub fn is_list_key(&self) -> bool {
        self.schema.is_key()
    }

    /// Declared schema default, if any
    pub fn declared_default(&self) -> Option<Value> {
        self.schema.default().cloned()
    }

    /// Classify this node. A list schema node addressed through an entry
    /// segment classifies as a list element.
    pub fn kind(&self) -> NodeKind {
        if self.schema.kind() == NodeKind::List
            && matches!(self.path.last(), Some(PathSegment::Entry { .. }))
        {
            NodeKind::ListElement
        } else {
            self.schema.kind()
        }
    }

    /// Resolve a declared child by bare or `ns:name`-qualified name
    pub fn child(&self, name: &str) -> Result<Node> {
        let schema = self
            .schema
            .find_child(name)
            .ok_or_else(|| Error::ChildNotFound {
                path: self.path.to_string(),
                name: name.to_string(),
            })?;
        Ok(self.make_child(schema))
    }

    /// All addressable children in declaration order, each with the name a
    /// sibling module would use for it (qualified when its namespace
    /// differs from this node's). Choice nodes are included; case levels
    /// are flattened away.
    pub fn children(&self) -> Vec<(String, Node)> {
        let parent_namespace = self.schema.namespace().to_string();
        self.schema
            .visible_children()
            .into_iter()
            .map(|schema| {
                let name = schema.qualified_name(&parent_namespace);
                (name, self.make_child(schema))
            })
            .collect()
    }

    fn make_child(&self, schema: Rc<SchemaNode>) -> Node {
        // Choice and case levels are transparent in the data tree
        let path = match schema.kind() {
            NodeKind::Choice | NodeKind::Case => self.path.clone(),
            _ => self.path.child(schema.name()),
        };
        Node {
            txn: self.txn.clone(),
            schema,
            path,
        }
    }

    /// Whether this instance exists. Presence containers and empty leaves
    /// answer from their explicit flag; value leaves from whether an
    /// explicit value is stored; everything else from having any data.
    pub fn exists(&self) -> bool {
        self.with_data(|data| match data {
            None => false,
            Some(DataNode::Presence { present, .. }) => *present,
            Some(DataNode::Flag(set)) => *set,
            Some(DataNode::Leaf(value)) => value.is_some(),
            Some(_) => true,
        })
    }

    /// Create this instance (presence container, empty leaf, or
    /// container-shaped node), materializing intermediate nodes.
    pub fn create(&self) -> Result<()> {
        match self.kind() {
            NodeKind::PresenceContainer => self.with_data_mut(|data| {
                if let DataNode::Presence { present, .. } = data {
                    *present = true;
                }
                Ok(())
            }),
            NodeKind::EmptyLeaf => self.with_data_mut(|data| {
                *data = DataNode::Flag(true);
                Ok(())
            }),
            NodeKind::Container | NodeKind::ParameterSet | NodeKind::ListElement => {
                self.with_data_mut(|_| Ok(()))
            }
            kind => Err(Error::Store {
                path: self.path.to_string(),
                message: format!("cannot create a {}", kind),
            }),
        }
    }

    /// Delete this instance and everything under it. Fails with
    /// [`Error::NotFound`] when it does not exist.
    pub fn delete(&self) -> Result<()> {
        if !self.exists() {
            return Err(Error::NotFound {
                path: self.path.to_string(),
            });
        }
        let mut data = self.txn.data.borrow_mut();
        remove(&mut data, self.path.segments());
        Ok(())
    }

    /// Read a value leaf together with its explicit/default tag.
    ///
    /// Explicit values are tagged explicit. An unset leaf reports its
    /// declared default — tagged as a default only under a
    /// suppressed-defaults view. An unset leaf without a declared default
    /// has nothing to report and fails with [`Error::ValuelessLeaf`].
    pub fn tagged_value(&self) -> Result<TaggedValue> {
        self.expect_kind(NodeKind::Leaf, "read a value")?;
        let stored = self.with_data(|data| match data {
            Some(DataNode::Leaf(value)) => value.clone(),
            _ => None,
        });
        match stored {
            Some(value) => Ok(TaggedValue {
                value,
                is_default: false,
            }),
            None => match self.declared_default() {
                Some(value) => Ok(TaggedValue {
                    value,
                    is_default: self.txn.suppress_defaults,
                }),
                None => Err(Error::ValuelessLeaf {
                    path: self.path.to_string(),
                }),
            },
        }
    }

    pub fn value(&self) -> Result<Value> {
        self.tagged_value().map(|tagged| tagged.value)
    }

    pub fn set_value(&self, value: Value) -> Result<()> {
        self.expect_kind(NodeKind::Leaf, "set a value")?;
        self.with_data_mut(|data| {
            *data = DataNode::Leaf(Some(value));
            Ok(())
        })
    }

    /// Ordered values of a leaf-list (empty when absent)
    pub fn leaf_list_values(&self) -> Result<Vec<Value>> {
        self.expect_kind(NodeKind::LeafList, "read leaf-list values")?;
        Ok(self.with_data(|data| match data {
            Some(DataNode::LeafList(values)) => values.clone(),
            _ => Vec::new(),
        }))
    }

    /// Replace the whole leaf-list in one operation
    pub fn set_leaf_list(&self, values: Vec<Value>) -> Result<()> {
        self.expect_kind(NodeKind::LeafList, "replace a leaf-list")?;
        self.with_data_mut(|data| {
            *data = DataNode::LeafList(values);
            Ok(())
        })
    }

    /// Append one value to a leaf-list, creating it if absent
    pub fn leaf_list_append(&self, value: Value) -> Result<()> {
        self.expect_kind(NodeKind::LeafList, "append to a leaf-list")?;
        self.with_data_mut(|data| {
            if let DataNode::LeafList(values) = data {
                values.push(value);
            }
            Ok(())
        })
    }

    /// Ordered key leaf names from the list schema
    pub fn list_key_names(&self) -> Result<Vec<String>> {
        match self.kind() {
            NodeKind::List | NodeKind::ListElement => Ok(self.schema.keys().to_vec()),
            kind => Err(Error::Store {
                path: self.path.to_string(),
                message: format!("no list keys on a {}", kind),
            }),
        }
    }

    /// Handles on every entry of this list, in insertion order
    pub fn list_entries(&self) -> Result<Vec<Node>> {
        self.expect_kind(NodeKind::List, "iterate entries")?;
        let key_tuples: Vec<Vec<Value>> = self.with_data(|data| match data {
            Some(DataNode::List(entries)) => entries.iter().map(|e| e.keys.clone()).collect(),
            _ => Vec::new(),
        });
        key_tuples
            .into_iter()
            .map(|keys| self.element(keys))
            .collect()
    }

    /// Handle on the entry with the given key tuple (whether or not it
    /// exists yet)
    pub fn element(&self, keys: Vec<Value>) -> Result<Node> {
        self.expect_kind(NodeKind::List, "address an entry")?;
        Ok(Node {
            txn: self.txn.clone(),
            schema: self.schema.clone(),
            path: self.path.parent().entry(self.schema.name(), keys),
        })
    }

    /// Fetch or create the entry with the given key tuple. Key leaves are
    /// materialized on creation and are part of the entry's identity.
    pub fn list_create(&self, keys: Vec<Value>) -> Result<Node> {
        self.expect_kind(NodeKind::List, "create an entry")?;
        if keys.len() != self.schema.keys().len() {
            return Err(Error::Store {
                path: self.path.to_string(),
                message: format!(
                    "expected {} key value(s), got {}",
                    self.schema.keys().len(),
                    keys.len()
                ),
            });
        }
        let element = self.element(keys)?;
        element.with_data_mut(|_| Ok(()))?;
        Ok(element)
    }

    fn expect_kind(&self, kind: NodeKind, operation: &str) -> Result<()> {
        if self.kind() == kind {
            Ok(())
        } else {
            Err(Error::Store {
                path: self.path.to_string(),
                message: format!("cannot {} on a {}", operation, self.kind()),
            })
        }
    }

    fn with_data<R>(&self, f: impl FnOnce(Option<&DataNode>) -> R) -> R {
        let data = self.txn.data.borrow();
        f(lookup(&data, self.path.segments()))
    }

    /// Run `f` on this node's data, materializing it (and intermediates)
    /// first.
    fn with_data_mut<R>(&self, f: impl FnOnce(&mut DataNode) -> Result<R>) -> Result<R> {
        let mut data = self.txn.data.borrow_mut();
        let node = ensure_mut(&mut data, &self.txn.schema, self.path.segments())?;
        f(node)
    }
}

fn child_map(node: &DataNode) -> Option<&HashMap<String, DataNode>> {
    match node {
        DataNode::Branch(children) | DataNode::Presence { children, .. } => Some(children),
        _ => None,
    }
}

fn child_map_mut(node: &mut DataNode) -> Option<&mut HashMap<String, DataNode>> {
    match node {
        DataNode::Branch(children) | DataNode::Presence { children, .. } => Some(children),
        _ => None,
    }
}

fn lookup<'a>(mut current: &'a DataNode, segments: &[PathSegment]) -> Option<&'a DataNode> {
    for segment in segments {
        match segment {
            PathSegment::Child(name) => {
                current = child_map(current)?.get(name)?;
            }
            PathSegment::Entry { name, keys } => match child_map(current)?.get(name)? {
                DataNode::List(entries) => {
                    current = &entries.iter().find(|e| &e.keys == keys)?.body;
                }
                _ => return None,
            },
        }
    }
    Some(current)
}

fn lookup_mut<'a>(
    mut current: &'a mut DataNode,
    segments: &[PathSegment],
) -> Option<&'a mut DataNode> {
    for segment in segments {
        match segment {
            PathSegment::Child(name) => {
                current = child_map_mut(current)?.get_mut(name)?;
            }
            PathSegment::Entry { name, keys } => match child_map_mut(current)?.get_mut(name)? {
                DataNode::List(entries) => {
                    let index = entries.iter().position(|e| &e.keys == keys)?;
                    current = &mut entries[index].body;
                }
                _ => return None,
            },
        }
    }
    Some(current)
}

/// Navigate to the data node for `segments`, creating schema-appropriate
/// intermediate data on the way.
fn ensure_mut<'a>(
    mut current: &'a mut DataNode,
    root_schema: &Rc<SchemaNode>,
    segments: &[PathSegment],
) -> Result<&'a mut DataNode> {
    let mut schema = root_schema.clone();
    let mut walked = KeyPath::root();
    for segment in segments {
        let name = match segment {
            PathSegment::Child(name) => name,
            PathSegment::Entry { name, .. } => name,
        };
        let child_schema = schema.find_child(name).ok_or_else(|| Error::ChildNotFound {
            path: walked.to_string(),
            name: name.clone(),
        })?;
        let map = child_map_mut(current).ok_or_else(|| Error::Store {
            path: walked.to_string(),
            message: "not a container node".to_string(),
        })?;
        match segment {
            PathSegment::Child(name) => {
                current = map
                    .entry(name.clone())
                    .or_insert_with(|| empty_data(&child_schema));
                walked = walked.child(name);
            }
            PathSegment::Entry { name, keys } => {
                let list = map
                    .entry(name.clone())
                    .or_insert_with(|| DataNode::List(Vec::new()));
                let DataNode::List(entries) = list else {
                    return Err(Error::Store {
                        path: walked.to_string(),
                        message: format!("'{}' is not a list", name),
                    });
                };
                let index = match entries.iter().position(|e| &e.keys == keys) {
                    Some(index) => index,
                    None => {
                        entries.push(new_entry(&child_schema, keys));
                        entries.len() - 1
                    }
                };
                current = &mut entries[index].body;
                walked = walked.entry(name, keys.clone());
            }
        }
        schema = child_schema;
    }
    Ok(current)
}

/// Fresh data for a node materialized implicitly by a write beneath it.
/// A presence container created this way is present: writing under it is
/// what brings it into existence.
fn empty_data(schema: &SchemaNode) -> DataNode {
    match schema.kind() {
        NodeKind::PresenceContainer => DataNode::Presence {
            present: true,
            children: HashMap::new(),
        },
        NodeKind::List => DataNode::List(Vec::new()),
        NodeKind::LeafList => DataNode::LeafList(Vec::new()),
        NodeKind::Leaf => DataNode::Leaf(None),
        NodeKind::EmptyLeaf => DataNode::Flag(false),
        _ => DataNode::Branch(HashMap::new()),
    }
}

fn new_entry(schema: &SchemaNode, keys: &[Value]) -> ListEntry {
    let mut children = HashMap::new();
    for (name, value) in schema.keys().iter().zip(keys.iter()) {
        children.insert(name.clone(), DataNode::Leaf(Some(value.clone())));
    }
    ListEntry {
        keys: keys.to_vec(),
        body: DataNode::Branch(children),
    }
}

fn remove(root: &mut DataNode, segments: &[PathSegment]) -> bool {
    let Some((last, init)) = segments.split_last() else {
        return false;
    };
    let Some(parent) = lookup_mut(root, init) else {
        return false;
    };
    match last {
        PathSegment::Child(name) => child_map_mut(parent)
            .and_then(|map| map.remove(name))
            .is_some(),
        PathSegment::Entry { name, keys } => {
            match child_map_mut(parent).and_then(|map| map.get_mut(name)) {
                Some(DataNode::List(entries)) => {
                    match entries.iter().position(|e| &e.keys == keys) {
                        Some(index) => {
                            entries.remove(index);
                            true
                        }
                        None => false,
                    }
                }
                _ => false,
            }
        }
    }
}

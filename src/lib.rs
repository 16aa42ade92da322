//! # conftree
//!
//! A schema-typed, transactional, in-memory configuration tree with a
//! recursive subtree-copy operation that understands the full range of
//! structural node kinds: containers, presence containers, lists and their
//! elements, leaf-lists, value and empty leaves, and choice/case branches.
//!
//! ## Quick Example
//!
//! ```
//! use conftree::copy::subtree_copy;
//! use conftree::schema::Schema;
//! use conftree::store::Store;
//! use conftree::value::Value;
//!
//! let schema = Schema::from_yaml(
//!     r#"
//! name: top
//! namespace: cfg
//! kind: container
//! children:
//!   - name: a
//!     kind: container
//!     children:
//!       - name: host
//!         kind: leaf
//!   - name: b
//!     kind: container
//!     children:
//!       - name: host
//!         kind: leaf
//! "#,
//! )
//! .unwrap();
//!
//! let store = Store::new(schema);
//! let root = store.transaction().root();
//!
//! let a = root.child("a").unwrap();
//! a.child("host").unwrap().set_value(Value::from("alpha")).unwrap();
//!
//! let b = root.child("b").unwrap();
//! subtree_copy(&a, &b, false).unwrap();
//! assert_eq!(b.child("host").unwrap().value().unwrap(), Value::from("alpha"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Schema (`schema`)**: the declared shape of the tree — node kinds,
//!   namespaces, defaults, list keys — parsed from YAML documents.
//! - **Store (`store`)**: instance data behind cheap transactional views.
//!   A suppressed-defaults view makes "unset, serving its default"
//!   observable, which the copy relies on to reconcile defaults.
//! - **Keypaths (`path`) and values (`value`)**: node addressing and the
//!   scalar/reference value union, including the portable string encoding
//!   of structural references.
//! - **Copy (`copy`)**: the recursive driver that synchronizes one subtree
//!   onto another, tolerating schema divergence child by child while
//!   failing loudly on structural kinds it has no rule for.
//!
//! The copy overwrites destination state from source state value for
//! value; it computes no diffs and validates no constraints. Atomicity and
//! isolation belong to the enclosing transaction.

pub mod copy;
pub mod error;
pub mod path;
pub mod schema;
pub mod store;
pub mod value;

#[cfg(test)]
mod path_proptest;

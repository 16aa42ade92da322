//! # Error Handling
//!
//! Centralized error type for the `conftree` crate, built with `thiserror`.
//! Each variant carries enough context (keypath, child name, node kind) to
//! pinpoint the failing node without a debugger.
//!
//! Two groups of variants matter to the copy algorithm:
//!
//! - **Recoverable**: `ChildNotFound` (the destination schema lacks a child),
//!   `NotFound` (delete/read of an absent instance) and `ValuelessLeaf` (a
//!   leaf with neither an explicit value nor a declared default). The copy
//!   driver skips or tolerates these.
//! - **Fatal**: `UnknownChildKind` (a structural kind the copy has no rule
//!   for — silently dropping it would lose data) and `ScalarSubtree` (the
//!   copy entry point was handed a value node instead of a structural one).

use crate::schema::NodeKind;
use thiserror::Error;

/// Main error type for conftree operations
#[derive(Error, Debug)]
pub enum Error {
    /// A schema document is structurally invalid (bad kind placement,
    /// unknown list key, default on a non-leaf, ...).
    #[error("Schema definition error: {message}")]
    Schema { message: String },

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A child lookup failed: the schema declares no such child under the
    /// given node.
    #[error("No child named '{name}' under {path}")]
    ChildNotFound { path: String, name: String },

    /// An instance operation (delete, entry lookup) targeted a node that
    /// does not exist in the data tree.
    #[error("Item does not exist: {path}")]
    NotFound { path: String },

    /// A value leaf holds no explicit value and its schema declares no
    /// default, so there is nothing to read.
    #[error("Leaf {path} holds no value and declares no default")]
    ValuelessLeaf { path: String },

    /// An operation was applied to a node whose kind does not support it
    /// (e.g. `set_value` on a container).
    #[error("Store operation error at {path}: {message}")]
    Store { path: String, message: String },

    /// A child was classified as a kind the copy algorithm has no rule for.
    /// This is fatal: skipping it would silently drop data.
    #[error("No copy rule for {path} of kind {kind}")]
    UnknownChildKind { path: String, kind: NodeKind },

    /// The copy entry point was invoked on a value node. Its contract is
    /// "copy a structural node", so this signals caller misuse.
    #[error("Cannot copy {path}: {kind} is not a structural node")]
    ScalarSubtree { path: String, kind: NodeKind },
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

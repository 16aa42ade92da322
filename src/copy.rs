//! # Recursive Subtree Copy
//!
//! Copies one subtree of a schema-typed configuration tree onto another,
//! possibly rooted in a different part of the tree or a different schema
//! module. This is an unconditional overwrite of destination state from
//! source state, value for value — not a diff engine and not a validator.
//!
//! ## How a copy runs
//!
//! [`subtree_copy`] opens a suppressed-defaults read view over the source's
//! transaction once, rebinds the source inside it, and hands off to the
//! recursive worker. The suppressed view is what makes "leaf is unset and
//! serving its default" distinguishable from "leaf explicitly set to that
//! same value", which drives the default reconciliation on every value leaf.
//!
//! Per node the worker dispatches on the classified kind:
//!
//! - container-shaped nodes (containers, presence containers, list
//!   elements, parameter sets, cases) copy child by child in declaration
//!   order, resolving each child on the destination by name — with a
//!   cross-namespace retry when the direct lookup fails — and skipping
//!   children the destination schema simply does not have;
//! - lists copy entry by entry, fetching or creating the destination entry
//!   from the source's key values read in the destination's key order;
//! - leaf-lists are replaced wholesale, unless any entry is a structural
//!   reference, in which case the destination is cleared and entries are
//!   appended one at a time through their portable string encoding
//!   (references cannot be written verbatim into a fresh leaf-list entry);
//! - value leaves go through default reconciliation and are otherwise
//!   copied best-effort: a leaf the destination cannot accept is logged and
//!   skipped rather than aborting the copy, since source and destination
//!   schemas are not guaranteed equivalent.
//!
//! A child kind with no rule here fails the whole copy: silently dropping
//! an unrecognized structural kind would corrupt the destination.
//!
//! When copying between two instances of the same kind of managed service,
//! `service_copy` additionally suppresses a fixed set of platform-internal
//! bookkeeping subtrees at the top level only.

use crate::error::{Error, Result};
use crate::schema::NodeKind;
use crate::store::Node;
use crate::value::Value;
use log::{debug, warn};

/// Platform-internal service bookkeeping nodes that must never be copied
/// between two service instances, as (local name, kind) pairs.
const SERVICE_META_BLACKLIST: [(&str, NodeKind); 7] = [
    ("private", NodeKind::Container),
    ("modified", NodeKind::Container),
    ("directly-modified", NodeKind::Container),
    ("device-list", NodeKind::LeafList),
    ("used-by-customer-service", NodeKind::LeafList),
    ("commit-queue", NodeKind::Container),
    ("log", NodeKind::Container),
];

/// Copy the subtree under `source` onto `destination`, in place.
///
/// `source` must be a structural node (container-shaped, list, or
/// leaf-list); handing a value leaf to this function is caller misuse and
/// fails with [`Error::ScalarSubtree`]. With `service_copy` set, the
/// service bookkeeping blacklist is applied at the top level.
///
/// The copy is idempotent: running it twice with an unchanged source
/// yields the same destination state as running it once. It never rolls
/// back — a fatal error aborts at the point of failure with prior writes
/// applied; atomicity, if wanted, belongs to the enclosing transaction.
pub fn subtree_copy(source: &Node, destination: &Node, service_copy: bool) -> Result<()> {
    let view = source.transaction().suppressed_defaults_view();
    let source = view.node_at(source.path())?;
    copy_node(&source, destination, service_copy, true)
}

fn copy_node(source: &Node, destination: &Node, service_copy: bool, top_level: bool) -> Result<()> {
    match source.kind() {
        NodeKind::Container
        | NodeKind::PresenceContainer
        | NodeKind::ListElement
        | NodeKind::ParameterSet
        | NodeKind::Case => copy_children(source, destination, service_copy, top_level),
        NodeKind::List => copy_list(source, destination, service_copy),
        NodeKind::LeafList => copy_leaf_list(source, destination),
        kind => Err(Error::ScalarSubtree {
            path: source.path().to_string(),
            kind,
        }),
    }
}

/// Copy every declared child of a container-shaped source onto the
/// destination.
fn copy_children(
    source: &Node,
    destination: &Node,
    service_copy: bool,
    top_level: bool,
) -> Result<()> {
    // Never overwrite the destination entry's key leaves: the key tuple is
    // the entry's identity.
    let destination_keys: Vec<String> = if destination.kind() == NodeKind::ListElement {
        destination.list_key_names()?
    } else {
        Vec::new()
    };

    for (name, src_child) in source.children() {
        if destination_keys.iter().any(|key| key == src_child.name()) {
            continue;
        }
        if src_child.kind() == NodeKind::Action {
            continue;
        }
        if service_copy
            && top_level
            && SERVICE_META_BLACKLIST.contains(&(src_child.name(), src_child.kind()))
        {
            continue;
        }

        let Some(dst_child) = resolve_destination_child(destination, &name) else {
            continue;
        };

        match src_child.kind() {
            NodeKind::Container
            | NodeKind::PresenceContainer
            | NodeKind::List
            | NodeKind::LeafList => {
                if src_child.kind() == NodeKind::PresenceContainer {
                    if src_child.exists() {
                        if dst_child.kind() == NodeKind::PresenceContainer {
                            dst_child.create()?;
                        }
                    } else {
                        tolerant_delete(&dst_child)?;
                        continue;
                    }
                } else if dst_child.kind() == NodeKind::PresenceContainer {
                    // Only the destination is presence-typed: bring it into
                    // existence unconditionally before filling it.
                    dst_child.create()?;
                }
                copy_node(&src_child, &dst_child, service_copy, false)?;
            }
            NodeKind::Choice => {
                // The chosen branch is implicit in which case's children
                // are populated; those children are copied as ordinary
                // flattened children of this container.
            }
            NodeKind::Leaf => copy_value_leaf(&src_child, &dst_child),
            NodeKind::EmptyLeaf => {
                if src_child.exists() {
                    dst_child.create()?;
                } else if dst_child.exists() {
                    // Deleting an already-absent empty leaf is invalid on
                    // the store, so the guard is required.
                    dst_child.delete()?;
                }
            }
            kind => {
                return Err(Error::UnknownChildKind {
                    path: src_child.path().to_string(),
                    kind,
                });
            }
        }
    }
    Ok(())
}

/// Resolve the destination counterpart of a source child. When the direct
/// lookup of a qualified name fails, retry under the assumption that the
/// child shares the destination parent's namespace. An unresolvable child
/// is skipped, not fatal: the schemas are allowed to diverge.
fn resolve_destination_child(destination: &Node, name: &str) -> Option<Node> {
    match destination.child(name) {
        Ok(node) => Some(node),
        Err(_) => {
            if let Some((_, local)) = name.split_once(':') {
                let requalified = format!("{}:{}", destination.namespace(), local);
                if let Ok(node) = destination.child(&requalified) {
                    return Some(node);
                }
            }
            warn!(
                "skipping '{}': no destination counterpart under {}",
                name,
                destination.path()
            );
            None
        }
    }
}

/// Copy a list entry by entry. Key values are read from each source entry
/// in the destination's declared key order and the destination entry is
/// fetched or created from them before recursing into its contents.
fn copy_list(source: &Node, destination: &Node, service_copy: bool) -> Result<()> {
    let key_names = destination.list_key_names()?;
    for src_entry in source.list_entries()? {
        let mut keys = Vec::with_capacity(key_names.len());
        for key_name in &key_names {
            keys.push(src_entry.child(key_name)?.value()?);
        }
        let dst_entry = destination.list_create(keys)?;
        copy_node(&src_entry, &dst_entry, service_copy, false)?;
    }
    Ok(())
}

/// Replace the destination leaf-list with the source's values.
///
/// All-scalar contents are written in a single wholesale replacement. If
/// any entry is a structural reference, the destination is cleared and the
/// entries are appended one at a time, references converted to their
/// portable path-string form — a reference value cannot be round-tripped
/// into a freshly created leaf-list entry.
fn copy_leaf_list(source: &Node, destination: &Node) -> Result<()> {
    let values = source.leaf_list_values()?;
    if values.iter().any(Value::is_ref) {
        tolerant_delete(destination)?;
        for value in values {
            destination.leaf_list_append(value.to_portable())?;
        }
    } else {
        destination.set_leaf_list(values)?;
    }
    Ok(())
}

/// Copy one value leaf, reconciling defaults, on a best-effort basis: any
/// failure is logged and swallowed, since a single incompatible leaf must
/// not abort the whole copy when source and destination schemas diverge.
fn copy_value_leaf(source: &Node, destination: &Node) {
    if let Err(err) = try_copy_value_leaf(source, destination) {
        debug!("skipping leaf {}: {}", source.path(), err);
    }
}

fn try_copy_value_leaf(source: &Node, destination: &Node) -> Result<()> {
    let tagged = source.tagged_value()?;
    if tagged.is_default {
        // The source leaf is unset and serving its schema default. If the
        // destination declares the same default, unset the destination and
        // let it serve its own; otherwise the source default must be
        // written explicitly, or the destination would serve a different
        // value.
        let src_default = source.declared_default();
        let dst_default = destination.declared_default();
        if dst_default.is_some() && src_default == dst_default {
            return tolerant_delete(destination);
        }
        if let Some(default) = src_default {
            destination.set_value(default)?;
        }
        return Ok(());
    }
    destination.set_value(tagged.value)
}

/// Delete that treats "already absent" as a no-op and re-raises anything
/// else.
fn tolerant_delete(node: &Node) -> Result<()> {
    match node.delete() {
        Ok(()) => Ok(()),
        Err(Error::NotFound { .. }) => Ok(()),
        Err(err) => Err(err),
    }
}

//! A node in the property tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::generator::PropertyValue;
use crate::graph::LogicalTime;

/// Opaque node identifier into the tree arena.
///
/// Also serves as the setter identity for priority arbitration: any node
/// of the tree may be attributed as the writer of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A property node: named children and/or a value slot.
///
/// A node may hold both a value and children at the same time (mixed
/// leaf/branch). `Some(Literal(Value::Null))` is an explicit null: still
/// enumerated, dropped by `list_values`. `None` is a pure branch.
///
/// The parent reference is a non-owning id into the arena: it is used only
/// for `..` path resolution, never for ownership or traversal cycles.
#[derive(Debug, Clone)]
pub struct PropertyNode<T: LogicalTime> {
    pub(crate) key: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: BTreeMap<String, NodeId>,
    pub(crate) value: Option<PropertyValue<T>>,
    /// Attribution of the last writer, consulted by the arbitration policy.
    pub(crate) setter: Option<NodeId>,
}

impl<T: LogicalTime> PropertyNode<T> {
    pub(crate) fn new(key: String, parent: Option<NodeId>) -> Self {
        Self {
            key,
            parent,
            children: BTreeMap::new(),
            value: None,
            setter: None,
        }
    }

    /// The node's own key; `""` only for the root.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The raw stored slot: literal, generator, or nothing.
    pub fn value(&self) -> Option<&PropertyValue<T>> {
        self.value.as_ref()
    }

    /// The identity attributed with the last write to this node.
    pub fn setter(&self) -> Option<NodeId> {
        self.setter
    }

    pub fn child(&self, key: &str) -> Option<NodeId> {
        self.children.get(key).copied()
    }

    /// Child keys in deterministic (lexicographic) order. Keys holding an
    /// explicit null are still present here.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

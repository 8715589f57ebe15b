//! # Property Tree
//!
//! Arena-backed tree of [`PropertyNode`]s. The arena is the ownership
//! story: nodes are reached by [`NodeId`], the parent back-reference is a
//! plain id (never an ownership edge), and removal is structural deletion
//! of a subtree from the arena.
//!
//! This module is purely structural: no time, no arbitration, no
//! generator execution. Those live in [`crate::graph`].

pub mod node;

pub use node::{NodeId, PropertyNode};

use hashbrown::HashMap;

use crate::generator::PropertyValue;
use crate::graph::LogicalTime;
use crate::model::{PropertyPath, Segment};
use crate::{Error, Result};

/// The node arena. Exactly one per graph; all nodes of a tree live here.
#[derive(Debug)]
pub struct PropertyTree<T: LogicalTime> {
    nodes: HashMap<NodeId, PropertyNode<T>>,
    root: NodeId,
    next_id: u64,
}

impl<T: LogicalTime> PropertyTree<T> {
    /// Create an arena holding only the root (key `""`, no parent).
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, PropertyNode::new(String::new(), None));
        Self { nodes, root, next_id: 1 }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&PropertyNode<T>> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut PropertyNode<T>> {
        self.nodes.get_mut(&id)
    }

    fn require(&self, id: NodeId) -> Result<&PropertyNode<T>> {
        self.nodes.get(&id).ok_or(Error::UnknownNode(id))
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Structure: create / remove
    // ========================================================================

    /// Get or create the child `key` of `parent`. The key must already be
    /// validated (all callers go through `PropertyPath`).
    pub(crate) fn ensure_child(&mut self, parent: NodeId, key: &str) -> Result<NodeId> {
        if let Some(existing) = self.require(parent)?.child(key) {
            return Ok(existing);
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, PropertyNode::new(key.to_string(), Some(parent)));
        self.nodes
            .get_mut(&parent)
            .expect("parent checked above")
            .children
            .insert(key.to_string(), id);
        Ok(id)
    }

    /// Detach the child `key` from `parent` and free its whole subtree.
    /// Returns the removed node's own value slot, if any.
    pub(crate) fn remove_child(
        &mut self,
        parent: NodeId,
        key: &str,
    ) -> Result<Option<Option<PropertyValue<T>>>> {
        let Some(child) = self.require(parent)?.child(key) else {
            return Ok(None);
        };
        self.nodes
            .get_mut(&parent)
            .expect("parent checked above")
            .children
            .remove(key);
        Ok(Some(self.free_subtree(child)))
    }

    /// Drop every child subtree of `id`.
    pub(crate) fn clear_children(&mut self, id: NodeId) -> Result<()> {
        let children: Vec<NodeId> = self.require(id)?.children.values().copied().collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children.clear();
        }
        for child in children {
            self.free_subtree(child);
        }
        Ok(())
    }

    /// Remove `id` and all descendants from the arena; returns the removed
    /// node's own value slot.
    fn free_subtree(&mut self, id: NodeId) -> Option<PropertyValue<T>> {
        let own_value = self.nodes.get_mut(&id).and_then(|n| n.value.take());
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children.values().copied());
            }
        }
        own_value
    }

    // ========================================================================
    // Path resolution
    // ========================================================================

    /// Walk `path` from `from` (or the root, for absolute paths) without
    /// creating anything. `Ok(None)` means some segment is missing; a `..`
    /// above the root also resolves to nothing.
    pub fn resolve(&self, from: NodeId, path: &PropertyPath) -> Result<Option<NodeId>> {
        let mut current = if path.is_absolute() { self.root } else { from };
        self.require(current)?;
        for segment in path.segments() {
            let node = self.require(current)?;
            current = match segment {
                Segment::Parent => match node.parent() {
                    Some(p) => p,
                    None => return Ok(None),
                },
                Segment::Key(key) => match node.child(key) {
                    Some(c) => c,
                    None => return Ok(None),
                },
            };
        }
        Ok(Some(current))
    }

    /// Walk `path` from `from`, creating missing intermediate nodes. A `..`
    /// above the root is an error here: a write cannot invent a parent.
    pub(crate) fn resolve_or_create(
        &mut self,
        from: NodeId,
        path: &PropertyPath,
    ) -> Result<NodeId> {
        let mut current = if path.is_absolute() { self.root } else { from };
        self.require(current)?;
        for segment in path.segments() {
            current = match segment {
                Segment::Parent => {
                    self.require(current)?.parent().ok_or_else(|| Error::InvalidPath {
                        path: path.to_string(),
                        reason: "no parent above the root".to_string(),
                    })?
                }
                Segment::Key(key) => self.ensure_child(current, key)?,
            };
        }
        Ok(current)
    }

    // ========================================================================
    // Index bookkeeping
    // ========================================================================

    /// One past the highest integer-looking child key, as a string; `"0"`
    /// if none. A child that is nothing but an explicit null does not
    /// count; branch nodes and real values do.
    pub fn next_index(&self, id: NodeId) -> Result<String> {
        let node = self.require(id)?;
        let mut max: Option<u64> = None;
        for (key, child) in &node.children {
            let Ok(index) = key.parse::<u64>() else { continue };
            let counted = self
                .nodes
                .get(child)
                .is_some_and(|c| !(c.children.is_empty() && matches!(c.value(), Some(v) if v.is_null_literal())));
            if counted {
                max = Some(max.map_or(index, |m| m.max(index)));
            }
        }
        Ok(match max {
            Some(m) => (m + 1).to_string(),
            None => "0".to_string(),
        })
    }
}

impl<T: LogicalTime> Default for PropertyTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! # Graph — Time & Change Coordinator
//!
//! The per-tree coordinator: owns the current logical time, a time-ordered
//! queue of pending [`Change`]s, the node arena, and the arbitration
//! policy.
//!
//! Scheduling model: none. Every operation is synchronous and the graph is
//! single-writer by construction (`&mut self` on every mutation). The
//! atomicity guarantee of [`Graph::set_time`], that all changes scheduled
//! at instants `<= new_time` become visible together, follows directly: no
//! other mutation can interleave with a flush.

pub mod change;
pub mod policy;
mod query;

pub use change::Change;
pub use policy::{ArbitrationPolicy, ChangeObserver, LastWriterWins};

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::generator::PropertyValue;
use crate::model::path;
use crate::model::{Filter, PropertyPath, Value};
use crate::tree::{NodeId, PropertyNode, PropertyTree};
use crate::{Error, Result};

/// Logical time: any totally-ordered, cloneable, printable progression.
/// Unrelated to wall-clock time.
pub trait LogicalTime: Ord + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T: Ord + Clone + fmt::Debug + Send + Sync + 'static> LogicalTime for T {}

/// The property graph: one tree, one clock, one policy.
pub struct Graph<T: LogicalTime = u64> {
    now: T,
    /// Scheduled changes, keyed by time in ascending order; each bucket is
    /// FIFO by recording order.
    pending: BTreeMap<T, Vec<Change<T>>>,
    tree: PropertyTree<T>,
    policy: Box<dyn ArbitrationPolicy>,
    observer: Option<Box<dyn ChangeObserver<T>>>,
}

impl<T: LogicalTime> Graph<T> {
    /// Create a graph at `initial_time` holding only the root node.
    pub fn new(initial_time: T) -> Self {
        Self {
            now: initial_time,
            pending: BTreeMap::new(),
            tree: PropertyTree::new(),
            policy: Box::new(LastWriterWins),
            observer: None,
        }
    }

    pub fn with_policy(initial_time: T, policy: impl ArbitrationPolicy + 'static) -> Self {
        let mut graph = Self::new(initial_time);
        graph.policy = Box::new(policy);
        graph
    }

    /// Replace the arbitration policy.
    pub fn set_policy(&mut self, policy: impl ArbitrationPolicy + 'static) {
        self.policy = Box::new(policy);
    }

    /// Install the change-notification hook (replacing any previous one).
    pub fn set_observer(&mut self, observer: impl ChangeObserver<T> + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Read-only access to a node's slot.
    pub fn node(&self, id: NodeId) -> Option<&PropertyNode<T>> {
        self.tree.node(id)
    }

    pub(crate) fn tree(&self) -> &PropertyTree<T> {
        &self.tree
    }

    // ========================================================================
    // Time
    // ========================================================================

    pub fn time(&self) -> &T {
        &self.now
    }

    /// Advance logical time, flushing every pending bucket with
    /// `t <= new_time` in ascending time order (FIFO within a bucket)
    /// before the new time becomes visible.
    ///
    /// Fails with [`Error::OutOfOrderTime`] if `new_time` is smaller than
    /// the current time, leaving all state unchanged.
    pub fn set_time(&mut self, new_time: T) -> Result<()> {
        if new_time < self.now {
            return Err(Error::OutOfOrderTime {
                now: format!("{:?}", self.now),
                requested: format!("{new_time:?}"),
            });
        }

        let mut applied = 0usize;
        while let Some((t, _)) = self.pending.first_key_value() {
            if *t > new_time {
                break;
            }
            let (when, bucket) = self.pending.pop_first().expect("bucket checked above");
            for change in bucket {
                // The target may have been removed since the change was
                // recorded; a flush never half-fails, so drop and move on.
                if !self.tree.contains(change.node) {
                    debug!(node = %change.node, key = %change.key, when = ?when,
                           "dropping scheduled change for removed node");
                    continue;
                }
                self.apply_write(change.setter, change.node, &change.key, change.value, change.force)?;
                applied += 1;
            }
        }
        if applied > 0 {
            debug!(applied, now = ?new_time, "flushed scheduled changes");
        }
        self.now = new_time;
        Ok(())
    }

    /// Number of changes still waiting for their time.
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Immediate write: apply `value` at `path` (resolved from `from`) now.
    pub fn set(
        &mut self,
        setter: NodeId,
        from: NodeId,
        path: &str,
        value: impl Into<PropertyValue<T>>,
    ) -> Result<()> {
        let when = self.now.clone();
        self.set_at(setter, from, path, value, when, false)
    }

    /// Scheduled write: apply immediately if `when <= now`, otherwise
    /// record a [`Change`] for the flush at `when`.
    ///
    /// The terminal's parent chain is resolved (and created) immediately;
    /// only the value installation waits for its time.
    pub fn set_at(
        &mut self,
        setter: NodeId,
        from: NodeId,
        path: &str,
        value: impl Into<PropertyValue<T>>,
        when: T,
        force: bool,
    ) -> Result<()> {
        if !self.tree.contains(setter) {
            return Err(Error::UnknownNode(setter));
        }
        let parsed = PropertyPath::parse(path)?;
        let (prefix, key) = parsed.split_for_write()?;
        let target = self.tree.resolve_or_create(from, &prefix)?;
        self.submit(Change::new(setter, target, key, value, force, when))
    }

    /// Dispatch a pre-built change: apply now if due, else enqueue.
    pub fn submit(&mut self, change: Change<T>) -> Result<()> {
        // Change is the one write entry that bypasses PropertyPath parsing.
        if !path::is_valid_key(&change.key) {
            return Err(Error::InvalidPath {
                path: change.key.clone(),
                reason: "key contains characters outside [A-Za-z0-9_$]".to_string(),
            });
        }
        if change.when <= self.now {
            trace!(node = %change.node, key = %change.key, "change due, applying");
            self.apply_write(change.setter, change.node, &change.key, change.value, change.force)
        } else {
            trace!(node = %change.node, key = %change.key, when = ?change.when, "change scheduled");
            self.pending.entry(change.when.clone()).or_default().push(change);
            Ok(())
        }
    }

    /// Materialize the node at `path` without writing a value; returns its
    /// id. Intermediate nodes are created as needed.
    pub fn ensure_node(&mut self, from: NodeId, path: &str) -> Result<NodeId> {
        self.tree.resolve_or_create(from, &PropertyPath::parse(path)?)
    }

    /// The single write primitive: install `value` as child `key` of
    /// `node`, subject to arbitration, expanding lists into child trees.
    fn apply_write(
        &mut self,
        setter: NodeId,
        node: NodeId,
        key: &str,
        value: PropertyValue<T>,
        force: bool,
    ) -> Result<()> {
        let child = self.tree.ensure_child(node, key)?;

        // Arbitration applies only when overwriting a different setter's
        // value; first-time writes and forced writes always land.
        if !force {
            let target = self.tree.node(child).expect("child just ensured");
            if target.value().is_some() {
                if let Some(incumbent) = target.setter() {
                    if incumbent != setter && self.policy.lower_priority(setter, incumbent) {
                        debug!(%node, key, %setter, %incumbent, "write dropped by arbitration");
                        return Ok(());
                    }
                }
            }
        }

        // Indexed collections: a list literal becomes a freshly built
        // child tree, one child per element, keyed "0", "1", ...
        if let PropertyValue::Literal(Value::List(items)) = value {
            {
                let n = self.tree.node_mut(child).expect("child just ensured");
                n.setter = Some(setter);
                n.value = None;
            }
            self.tree.clear_children(child)?;
            for (index, item) in items.into_iter().enumerate() {
                self.apply_write(setter, child, &index.to_string(), PropertyValue::Literal(item), force)?;
            }
            return Ok(());
        }

        let old = {
            let n = self.tree.node_mut(child).expect("child just ensured");
            n.setter = Some(setter);
            n.value.replace(value)
        };
        trace!(%node, key, %setter, "property written");
        if let Some(observer) = self.observer.as_mut() {
            let new = self.tree.node(child).and_then(|n| n.value());
            observer.on_change(setter, node, key, old.as_ref(), new);
        }
        Ok(())
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove every direct child of `from` whose resolved value matches
    /// `filter`, subject to the same arbitration rule as `set`. Returns
    /// the number of children removed.
    pub fn clear(&mut self, setter: NodeId, from: NodeId, filter: &dyn Filter) -> Result<usize> {
        let children: Vec<(String, NodeId)> = self
            .tree
            .node(from)
            .ok_or(Error::UnknownNode(from))?
            .children
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        let mut doomed = Vec::new();
        for (key, child) in children {
            let candidate = self.resolved_node_value(child)?.unwrap_or(Value::Null);
            if filter.matches(&candidate) {
                doomed.push((key, child));
            }
        }

        let mut removed = 0usize;
        for (key, child) in doomed {
            if self.yields_to_incumbent(setter, child) {
                debug!(node = %from, %key, %setter, "clear skipped by arbitration");
                continue;
            }
            if let Some(old) = self.tree.remove_child(from, &key)? {
                if let Some(observer) = self.observer.as_mut() {
                    observer.on_change(setter, from, &key, old.as_ref(), None);
                }
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove the single property addressed by `path`, subject to
    /// arbitration. Returns whether anything was removed.
    pub fn remove(&mut self, setter: NodeId, from: NodeId, path: &str) -> Result<bool> {
        let parsed = PropertyPath::parse(path)?;
        let (prefix, key) = parsed.split_for_write()?;
        let Some(parent) = self.tree.resolve(from, &prefix)? else {
            return Ok(false);
        };
        let Some(child) = self.tree.node(parent).and_then(|n| n.child(key)) else {
            return Ok(false);
        };
        if self.yields_to_incumbent(setter, child) {
            debug!(node = %parent, key = %key, %setter, "remove skipped by arbitration");
            return Ok(false);
        }
        if let Some(old) = self.tree.remove_child(parent, key)? {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_change(setter, parent, key, old.as_ref(), None);
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn yields_to_incumbent(&self, setter: NodeId, target: NodeId) -> bool {
        match self.tree.node(target).and_then(|n| n.setter()) {
            Some(incumbent) => incumbent != setter && self.policy.lower_priority(setter, incumbent),
            None => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Read-side operations: path resolution, typed access, queries over
//! children. Generator execution happens here, depth-bounded.

use tracing::trace;

use crate::generator::{PropertyValue, ReadContext, MAX_GENERATOR_DEPTH};
use crate::model::{Filter, FromValue, PropertyPath, Value, ValueKind};
use crate::tree::NodeId;
use crate::{Error, Result};

use super::{Graph, LogicalTime};

impl<T: LogicalTime> Graph<T> {
    // ========================================================================
    // Resolution core
    // ========================================================================

    /// Resolve `path` from `from` and produce the value at the terminal,
    /// executing generators with `expected` as the type hint and `depth`
    /// as the remaining generator budget.
    ///
    /// `Ok(None)` means no node or no value; `Ok(Some(Null))` is an
    /// explicit stored null.
    pub(crate) fn resolve_value(
        &self,
        from: NodeId,
        path: &PropertyPath,
        expected: ValueKind,
        depth: u32,
    ) -> Result<Option<Value>> {
        let Some(terminal) = self.tree().resolve(from, path)? else {
            return Ok(None);
        };
        self.node_value_bounded(terminal, expected, depth)
    }

    fn node_value_bounded(
        &self,
        id: NodeId,
        expected: ValueKind,
        depth: u32,
    ) -> Result<Option<Value>> {
        let node = self.tree().node(id).ok_or(Error::UnknownNode(id))?;
        match node.value() {
            None => Ok(None),
            Some(PropertyValue::Literal(v)) => Ok(Some(v.clone())),
            Some(PropertyValue::Generator(g)) => {
                if depth == 0 {
                    return Err(Error::GeneratorDepthExceeded { limit: MAX_GENERATOR_DEPTH });
                }
                let generator = g.clone();
                let owner = node.parent().unwrap_or(id);
                let key = node.key().to_string();
                trace!(node = %id, %key, "executing generator");
                let ctx = ReadContext::new(self, owner, depth - 1);
                generator.generate(&ctx, &key, expected).map(Some)
            }
        }
    }

    /// Resolved value of a node itself (not a path), full budget.
    pub(crate) fn resolved_node_value(&self, id: NodeId) -> Result<Option<Value>> {
        self.node_value_bounded(id, ValueKind::Any, MAX_GENERATOR_DEPTH)
    }

    // ========================================================================
    // find / get
    // ========================================================================

    /// Untyped resolution. `Ok(None)` for a missing path; an explicit null
    /// reads as `Ok(Some(Value::Null))`.
    pub fn find_value(&self, from: NodeId, path: &str) -> Result<Option<Value>> {
        self.resolve_value(from, &PropertyPath::parse(path)?, ValueKind::Any, MAX_GENERATOR_DEPTH)
    }

    /// Typed resolution. Missing paths and explicit nulls read as
    /// `Ok(None)`; a present value of the wrong type is a
    /// [`Error::TypeMismatch`].
    pub fn find<V: FromValue>(&self, from: NodeId, path: &str) -> Result<Option<V>> {
        let resolved =
            self.resolve_value(from, &PropertyPath::parse(path)?, V::EXPECTED, MAX_GENERATOR_DEPTH)?;
        match resolved {
            None | Some(Value::Null) => Ok(None),
            Some(v) => V::from_value(&v).map(Some),
        }
    }

    /// Like [`Graph::find`], but a missing path yields `default`; absence
    /// is never an error.
    pub fn find_or<V: FromValue>(&self, from: NodeId, path: &str, default: V) -> Result<V> {
        Ok(self.find(from, path)?.unwrap_or(default))
    }

    /// Typed resolution that must succeed: [`Error::NotFound`] if no
    /// property exists at `path` (explicit nulls included),
    /// [`Error::TypeMismatch`] if the value does not conform.
    pub fn get<V: FromValue>(&self, from: NodeId, path: &str) -> Result<V> {
        let resolved =
            self.resolve_value(from, &PropertyPath::parse(path)?, V::EXPECTED, MAX_GENERATOR_DEPTH)?;
        match resolved {
            None | Some(Value::Null) => Err(Error::NotFound(path.to_string())),
            Some(v) => V::from_value(&v),
        }
    }

    /// Low-level access to the stored slot. With
    /// `execute_generators = false` the generator instance itself is
    /// returned, if one is stored.
    pub fn find_raw(
        &self,
        from: NodeId,
        path: &str,
        execute_generators: bool,
    ) -> Result<Option<PropertyValue<T>>> {
        if execute_generators {
            return Ok(self.find_value(from, path)?.map(PropertyValue::Literal));
        }
        let Some(terminal) = self.tree().resolve(from, &PropertyPath::parse(path)?)? else {
            return Ok(None);
        };
        let node = self.tree().node(terminal).ok_or(Error::UnknownNode(terminal))?;
        Ok(node.value().cloned())
    }

    // ========================================================================
    // Queries over children
    // ========================================================================

    /// Keys of direct children whose resolved value satisfies `filter`, in
    /// deterministic tree order. Children without a value are presented to
    /// the filter as `Value::Null`.
    pub fn query(&self, from: NodeId, filter: &dyn Filter) -> Result<Vec<String>> {
        let node = self.tree().node(from).ok_or(Error::UnknownNode(from))?;
        let mut keys = Vec::new();
        for (key, child) in &node.children {
            let candidate = self.resolved_node_value(*child)?.unwrap_or(Value::Null);
            if filter.matches(&candidate) {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }

    /// Keys of direct children whose resolved value equals `value`.
    pub fn keys_of(&self, from: NodeId, value: &Value) -> Result<Vec<String>> {
        let node = self.tree().node(from).ok_or(Error::UnknownNode(from))?;
        let mut keys = Vec::new();
        for (key, child) in &node.children {
            let candidate = self.resolved_node_value(*child)?.unwrap_or(Value::Null);
            if candidate == *value {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }

    pub fn contains(&self, from: NodeId, value: &Value) -> Result<bool> {
        Ok(!self.keys_of(from, value)?.is_empty())
    }

    /// Child keys in deterministic order. A key holding an explicit null
    /// is still enumerated.
    pub fn keys(&self, from: NodeId) -> Result<Vec<String>> {
        let node = self.tree().node(from).ok_or(Error::UnknownNode(from))?;
        Ok(node.keys().map(str::to_string).collect())
    }

    // ========================================================================
    // Indexed collections
    // ========================================================================

    /// One past the highest integer-looking child key, as a string; `"0"`
    /// if none exist.
    pub fn next_index(&self, from: NodeId) -> Result<String> {
        self.tree().next_index(from)
    }

    pub fn is_empty_list(&self, from: NodeId) -> Result<bool> {
        Ok(self.next_index(from)? == "0")
    }

    /// Resolved values of matching children. Nulls are skipped; any
    /// non-conforming value fails with [`Error::TypeMismatch`].
    /// `only_indexed` restricts to integer-keyed children, in numeric
    /// order; otherwise all children contribute in tree order.
    pub fn list_values<V: FromValue>(&self, from: NodeId, only_indexed: bool) -> Result<Vec<V>> {
        let node = self.tree().node(from).ok_or(Error::UnknownNode(from))?;
        let selected: Vec<NodeId> = if only_indexed {
            let mut indexed: Vec<(u64, NodeId)> = node
                .children
                .iter()
                .filter_map(|(k, id)| k.parse::<u64>().ok().map(|i| (i, *id)))
                .collect();
            indexed.sort_unstable_by_key(|(i, _)| *i);
            indexed.into_iter().map(|(_, id)| id).collect()
        } else {
            node.children.values().copied().collect()
        };

        let mut values = Vec::with_capacity(selected.len());
        for id in selected {
            match self.resolved_node_value(id)? {
                None | Some(Value::Null) => continue,
                Some(v) => values.push(V::from_value(&v)?),
            }
        }
        Ok(values)
    }

    /// [`Graph::list_values`] scoped under `child_path`; an absent child
    /// yields an empty list.
    pub fn list_child_values<V: FromValue>(
        &self,
        from: NodeId,
        child_path: &str,
        only_indexed: bool,
    ) -> Result<Vec<V>> {
        let Some(child) = self.tree().resolve(from, &PropertyPath::parse(child_path)?)? else {
            return Ok(Vec::new());
        };
        self.list_values(child, only_indexed)
    }
}

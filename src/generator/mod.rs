//! # Generators
//!
//! A generator is a value substitute computed on read: the stored slot
//! holds a capability instead of a literal, and every read through
//! `find`/`get` invokes it with the requesting node, the key, and the
//! expected kind.
//!
//! Generators are *values*, not structural edges, so they can form logical
//! cycles (`/a` links to `/b` links to `/a`). Resolution is therefore
//! depth-bounded: a generator recurses through its [`ReadContext`], which
//! carries the remaining budget, and the bound cannot be restarted from
//! inside a generator.

pub mod link;

pub use link::Link;

use std::fmt;
use std::sync::Arc;

use crate::graph::{Graph, LogicalTime};
use crate::model::{FromValue, PropertyPath, Value, ValueKind};
use crate::tree::NodeId;
use crate::Result;

/// Maximum generator hops in one read. Exceeding it fails with
/// [`crate::Error::GeneratorDepthExceeded`].
pub const MAX_GENERATOR_DEPTH: u32 = 64;

// ============================================================================
// Generator trait
// ============================================================================

/// Compute a value on demand.
///
/// `ctx` names the node owning the generated key and allows bounded reads
/// elsewhere in the tree; `key` is the key being read; `expected` is the
/// caller's type hint (advisory; the caller still type-checks the result).
pub trait Generator<T: LogicalTime>: fmt::Debug + Send + Sync {
    fn generate(&self, ctx: &ReadContext<'_, T>, key: &str, expected: ValueKind) -> Result<Value>;
}

// ============================================================================
// ReadContext
// ============================================================================

/// The read-side capability handed to a generator.
///
/// Deliberately does not expose the graph itself: all recursive reads go
/// through this context so the resolution depth budget is inherited.
pub struct ReadContext<'g, T: LogicalTime> {
    graph: &'g Graph<T>,
    node: NodeId,
    remaining: u32,
}

impl<'g, T: LogicalTime> ReadContext<'g, T> {
    pub(crate) fn new(graph: &'g Graph<T>, node: NodeId, remaining: u32) -> Self {
        Self { graph, node, remaining }
    }

    /// The node owning the key being generated. Relative paths resolve
    /// from here.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The graph's current logical time.
    pub fn time(&self) -> &T {
        self.graph.time()
    }

    /// Resolve a parsed path with an expected-kind hint.
    pub fn resolve(&self, path: &PropertyPath, expected: ValueKind) -> Result<Option<Value>> {
        self.graph.resolve_value(self.node, path, expected, self.remaining)
    }

    /// Resolve a path string; `Ok(None)` for a missing path.
    pub fn find_value(&self, path: &str) -> Result<Option<Value>> {
        self.resolve(&PropertyPath::parse(path)?, ValueKind::Any)
    }

    /// Typed resolution; explicit nulls read as `Ok(None)`.
    pub fn find<V: FromValue>(&self, path: &str) -> Result<Option<V>> {
        match self.resolve(&PropertyPath::parse(path)?, V::EXPECTED)? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => V::from_value(&v).map(Some),
        }
    }
}

// ============================================================================
// PropertyValue — the stored slot
// ============================================================================

/// What a node's value slot holds: a literal, or a generator invoked on
/// every read (no caching of the generated result).
pub enum PropertyValue<T: LogicalTime> {
    Literal(Value),
    Generator(Arc<dyn Generator<T>>),
}

impl<T: LogicalTime> PropertyValue<T> {
    pub fn is_generator(&self) -> bool {
        matches!(self, PropertyValue::Generator(_))
    }

    /// True for an explicit stored null (a tombstone, not a branch).
    pub fn is_null_literal(&self) -> bool {
        matches!(self, PropertyValue::Literal(Value::Null))
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            PropertyValue::Literal(v) => Some(v),
            PropertyValue::Generator(_) => None,
        }
    }

    pub fn as_generator(&self) -> Option<&Arc<dyn Generator<T>>> {
        match self {
            PropertyValue::Literal(_) => None,
            PropertyValue::Generator(g) => Some(g),
        }
    }
}

impl<T: LogicalTime> Clone for PropertyValue<T> {
    fn clone(&self) -> Self {
        match self {
            PropertyValue::Literal(v) => PropertyValue::Literal(v.clone()),
            PropertyValue::Generator(g) => PropertyValue::Generator(g.clone()),
        }
    }
}

impl<T: LogicalTime> fmt::Debug for PropertyValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Literal(v) => write!(f, "Literal({v:?})"),
            PropertyValue::Generator(g) => write!(f, "Generator({g:?})"),
        }
    }
}

/// Literals compare by value; generators by identity (two slots holding
/// the same interned Link are equal).
impl<T: LogicalTime> PartialEq for PropertyValue<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Literal(a), PropertyValue::Literal(b)) => a == b,
            (PropertyValue::Generator(a), PropertyValue::Generator(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ============================================================================
// Conversions into PropertyValue
// ============================================================================

impl<T: LogicalTime> From<Value> for PropertyValue<T> {
    fn from(v: Value) -> Self {
        PropertyValue::Literal(v)
    }
}

impl<T: LogicalTime> From<Arc<dyn Generator<T>>> for PropertyValue<T> {
    fn from(g: Arc<dyn Generator<T>>) -> Self {
        PropertyValue::Generator(g)
    }
}

impl<T: LogicalTime> From<Arc<Link>> for PropertyValue<T> {
    fn from(link: Arc<Link>) -> Self {
        PropertyValue::Generator(link)
    }
}

impl<T: LogicalTime> From<bool> for PropertyValue<T> {
    fn from(v: bool) -> Self { PropertyValue::Literal(v.into()) }
}
impl<T: LogicalTime> From<i32> for PropertyValue<T> {
    fn from(v: i32) -> Self { PropertyValue::Literal(v.into()) }
}
impl<T: LogicalTime> From<i64> for PropertyValue<T> {
    fn from(v: i64) -> Self { PropertyValue::Literal(v.into()) }
}
impl<T: LogicalTime> From<f64> for PropertyValue<T> {
    fn from(v: f64) -> Self { PropertyValue::Literal(v.into()) }
}
impl<T: LogicalTime> From<&str> for PropertyValue<T> {
    fn from(v: &str) -> Self { PropertyValue::Literal(v.into()) }
}
impl<T: LogicalTime> From<String> for PropertyValue<T> {
    fn from(v: String) -> Self { PropertyValue::Literal(v.into()) }
}

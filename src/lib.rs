//! # propgraph — Hierarchical Property Graph
//!
//! A path-addressed store of named values with lazy generators, scheduled
//! changes, and deterministic conflict resolution between writers.
//!
//! ## Design Principles
//!
//! 1. **Single writer by construction**: the `Graph` owns the node arena;
//!    every mutation takes `&mut self`. No locks, no atomics in the core.
//! 2. **Clean DTOs**: `Value`, `PropertyPath`, `Change` cross all boundaries.
//! 3. **One policy seam**: swapping `ArbitrationPolicy` changes the entire
//!    conflict-resolution behavior without touching anything else.
//! 4. **Generators are values, not edges**: lazy reads (including `Link`
//!    indirection) can form logical cycles; resolution is depth-bounded.
//!
//! ## Quick Start
//!
//! ```rust
//! use propgraph::{Graph, Link, Value};
//!
//! # fn example() -> propgraph::Result<()> {
//! let mut graph: Graph = Graph::new(0);
//! let root = graph.root();
//!
//! // Write through paths; intermediate nodes appear on demand.
//! graph.set(root, root, "/engine/threads", 8i64)?;
//!
//! // Indirection: /alias reads whatever /engine/threads holds right now.
//! graph.set(root, root, "/alias", Link::to("/engine/threads")?)?;
//! assert_eq!(graph.get::<i64>(root, "/alias")?, 8);
//!
//! // Schedule a change for logical time 10; it applies when time reaches it.
//! graph.set_at(root, root, "/engine/threads", Value::Int(16), 10, false)?;
//! graph.set_time(10)?;
//! assert_eq!(graph.get::<i64>(root, "/alias")?, 16);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Contract
//!
//! | Guarantee | Where |
//! |-----------|-------|
//! | Time never moves backward | [`Graph::set_time`] |
//! | Changes at `t <= new_time` flush atomically, in time order | [`Graph::set_time`] |
//! | Same-instant changes apply FIFO by recording order | [`Graph::submit`] |
//! | Writes losing arbitration are dropped silently | [`ArbitrationPolicy`] |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod tree;
pub mod generator;
pub mod graph;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{Value, ValueKind, FromValue, PropertyPath, Segment};
pub use model::{Filter, Equals, NonNull};

// ============================================================================
// Re-exports: Tree
// ============================================================================

pub use tree::{NodeId, PropertyNode};

// ============================================================================
// Re-exports: Generators
// ============================================================================

pub use generator::{Generator, Link, PropertyValue, ReadContext, MAX_GENERATOR_DEPTH};

// ============================================================================
// Re-exports: Graph
// ============================================================================

pub use graph::{
    Graph, Change, LogicalTime,
    ArbitrationPolicy, LastWriterWins, ChangeObserver,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `set_time` was called with a time smaller than the current one.
    /// This is a contract violation, not a recoverable condition.
    #[error("time moved backward: now {now}, requested {requested}")]
    OutOfOrderTime { now: String, requested: String },

    #[error("no property at path: {0}")]
    NotFound(String),

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: &'static str, got: &'static str },

    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Generator recursion exceeded the resolution depth bound: almost
    /// always a Link cycle (A -> B -> A) or an unbounded Link chain.
    #[error("generator recursion exceeded depth {limit} (link cycle?)")]
    GeneratorDepthExceeded { limit: u32 },

    /// A `NodeId` that does not (or no longer does) name a live node.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
}

pub type Result<T> = std::result::Result<T, Error>;

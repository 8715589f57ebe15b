//! # Property Model
//!
//! Clean DTOs shared by every layer: values, paths, and the query
//! predicate contract.
//!
//! Design rule: this module is pure data — no arena access, no time, no
//! generator execution.

pub mod value;
pub mod path;
pub mod filter;

pub use value::{Value, ValueKind, FromValue};
pub use path::{PropertyPath, Segment};
pub use filter::{Filter, Equals, NonNull};

//! Link — a generator that redirects a read to another path.
//!
//! Links are stateless and immutable, so instances are interned: a
//! process-wide cache returns the same `Arc<Link>` for the same canonical
//! path. Two links with the same path are value-equal regardless of
//! interning.

use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use parking_lot::Mutex;

use super::{Generator, ReadContext};
use crate::graph::LogicalTime;
use crate::model::{PropertyPath, Value, ValueKind};
use crate::Result;

/// Path indirection: reading the linked key performs `find` at `path`,
/// relative to the node owning the key (absolute paths from the root).
///
/// The resolved value is never cached: changing the target changes what
/// the link reads from then on.
#[derive(Debug)]
pub struct Link {
    path: PropertyPath,
}

static INTERNED: OnceLock<Mutex<HashMap<String, Arc<Link>>>> = OnceLock::new();

impl Link {
    /// Interned constructor: the same canonical path yields the same
    /// `Arc`. Construction is side-effect-free, so sharing is safe.
    pub fn to(path: &str) -> Result<Arc<Link>> {
        let parsed = PropertyPath::parse(path)?;
        let canonical = parsed.to_string();

        let mut cache = INTERNED.get_or_init(Default::default).lock();
        if let Some(link) = cache.get(&canonical) {
            return Ok(link.clone());
        }
        let link = Arc::new(Link { path: parsed });
        cache.insert(canonical, link.clone());
        Ok(link)
    }

    pub fn path(&self) -> &PropertyPath {
        &self.path
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Link {}

impl std::hash::Hash for Link {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl<T: LogicalTime> Generator<T> for Link {
    fn generate(&self, ctx: &ReadContext<'_, T>, _key: &str, expected: ValueKind) -> Result<Value> {
        Ok(ctx.resolve(&self.path, expected)?.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_returns_same_instance() {
        let a = Link::to("/x/y").unwrap();
        let b = Link::to("/x/y").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = Link::to("/x/z").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_value_equality_by_path() {
        let a = Link::to("/p/q").unwrap();
        let b = Link::to("/p/q").unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *Link::to("/p").unwrap());
    }

    #[test]
    fn test_rejects_malformed_path() {
        assert!(Link::to("/bad key").is_err());
    }
}

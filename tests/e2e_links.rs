//! End-to-end tests for generators and link indirection.

use std::sync::Arc;

use propgraph::{
    Error, Generator, Graph, Link, PropertyValue, ReadContext, Result, Value, ValueKind,
};

// ============================================================================
// 1. A link reads whatever its target holds right now
// ============================================================================

#[test]
fn test_link_indirection() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();

    graph.set(root, root, "/x", Link::to("/y").unwrap()).unwrap();
    graph.set(root, root, "/y", 42i64).unwrap();

    assert_eq!(graph.get::<i64>(root, "/x").unwrap(), 42);

    // no caching of the resolved value: changing /y changes /x
    graph.set(root, root, "/y", 43i64).unwrap();
    assert_eq!(graph.get::<i64>(root, "/x").unwrap(), 43);
}

// ============================================================================
// 2. Relative links resolve from the node owning the linked key
// ============================================================================

#[test]
fn test_relative_link() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();

    graph.set(root, root, "/host/port", 7474i64).unwrap();
    graph.set(root, root, "/host/endpoint", Link::to("port").unwrap()).unwrap();

    assert_eq!(graph.get::<i64>(root, "/host/endpoint").unwrap(), 7474);
}

// ============================================================================
// 3. Link chains resolve hop by hop
// ============================================================================

#[test]
fn test_link_chain() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();

    graph.set(root, root, "/a", Link::to("/b").unwrap()).unwrap();
    graph.set(root, root, "/b", Link::to("/c").unwrap()).unwrap();
    graph.set(root, root, "/c", "end").unwrap();

    assert_eq!(graph.get::<String>(root, "/a").unwrap(), "end");
}

// ============================================================================
// 4. A link cycle fails with a dedicated error instead of recursing
// ============================================================================

#[test]
fn test_link_cycle_is_bounded() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();

    graph.set(root, root, "/a", Link::to("/b").unwrap()).unwrap();
    graph.set(root, root, "/b", Link::to("/a").unwrap()).unwrap();

    match graph.get::<i64>(root, "/a") {
        Err(Error::GeneratorDepthExceeded { limit }) => {
            assert_eq!(limit, propgraph::MAX_GENERATOR_DEPTH)
        }
        other => panic!("expected GeneratorDepthExceeded, got {other:?}"),
    }
}

// ============================================================================
// 5. A dangling link reads as absent, not as an error
// ============================================================================

#[test]
fn test_dangling_link() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();

    graph.set(root, root, "/x", Link::to("/nowhere").unwrap()).unwrap();
    assert_eq!(graph.find::<i64>(root, "/x").unwrap(), None);
}

// ============================================================================
// 6. find_raw exposes the stored generator without executing it
// ============================================================================

#[test]
fn test_find_raw_skips_generators() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();

    let link = Link::to("/y").unwrap();
    graph.set(root, root, "/x", link.clone()).unwrap();
    graph.set(root, root, "/y", 1i64).unwrap();

    // interning means the stored generator IS the link we built
    let raw = graph.find_raw(root, "/x", false).unwrap().unwrap();
    assert!(raw.is_generator());
    assert_eq!(raw, PropertyValue::from(link));

    match graph.find_raw(root, "/x", true).unwrap() {
        Some(PropertyValue::Literal(Value::Int(1))) => {}
        other => panic!("expected resolved literal, got {other:?}"),
    }
}

// ============================================================================
// 7. Custom generators: computed from other properties, never cached
// ============================================================================

/// Sums the integer children of a sibling subtree on every read.
#[derive(Debug)]
struct SumOf {
    path: String,
}

impl Generator<u64> for SumOf {
    fn generate(&self, ctx: &ReadContext<'_, u64>, _key: &str, _expected: ValueKind) -> Result<Value> {
        let a = ctx.find::<i64>(&format!("{}/a", self.path))?.unwrap_or(0);
        let b = ctx.find::<i64>(&format!("{}/b", self.path))?.unwrap_or(0);
        Ok(Value::Int(a + b))
    }
}

#[test]
fn test_custom_generator_recomputes() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();

    graph.set(root, root, "/in/a", 2i64).unwrap();
    graph.set(root, root, "/in/b", 3i64).unwrap();

    let r#gen: Arc<dyn Generator<u64>> = Arc::new(SumOf { path: "/in".to_string() });
    graph.set(root, root, "/sum", r#gen).unwrap();

    assert_eq!(graph.get::<i64>(root, "/sum").unwrap(), 5);

    graph.set(root, root, "/in/b", 10i64).unwrap();
    assert_eq!(graph.get::<i64>(root, "/sum").unwrap(), 12);
}

// ============================================================================
// 8. Generators resolve through scheduled changes like any other read
// ============================================================================

#[test]
fn test_link_sees_flushed_changes() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();

    graph.set(root, root, "/alias", Link::to("/target").unwrap()).unwrap();
    graph.set(root, root, "/target", 1i64).unwrap();
    graph.set_at(root, root, "/target", 2i64, 50, false).unwrap();

    assert_eq!(graph.get::<i64>(root, "/alias").unwrap(), 1);
    graph.set_time(50).unwrap();
    assert_eq!(graph.get::<i64>(root, "/alias").unwrap(), 2);
}

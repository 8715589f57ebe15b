//! End-to-end tests for priority arbitration between competing writers.
//!
//! The policy under test: writes attributed to `/setters/plugin` yield to
//! values owned by `/setters/core`; everything else is last-writer-wins.

use propgraph::{Graph, NodeId, NonNull, Value};

/// Build a graph with two setter identities and the plugin-yields-to-core
/// policy installed.
fn arena() -> (Graph, NodeId, NodeId, NodeId) {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();
    let core = graph.ensure_node(root, "/setters/core").unwrap();
    let plugin = graph.ensure_node(root, "/setters/plugin").unwrap();
    graph.set_policy(move |setter: NodeId, incumbent: NodeId| {
        setter == plugin && incumbent == core
    });
    (graph, root, core, plugin)
}

// ============================================================================
// 1. Default policy: last writer wins in both directions
// ============================================================================

#[test]
fn test_default_last_writer_wins() {
    let mut graph: Graph = Graph::new(0);
    let root = graph.root();
    let a = graph.ensure_node(root, "/a").unwrap();
    let b = graph.ensure_node(root, "/b").unwrap();

    graph.set(a, root, "/k", 1i64).unwrap();
    graph.set(b, root, "/k", 2i64).unwrap();
    assert_eq!(graph.get::<i64>(root, "/k").unwrap(), 2);

    graph.set(a, root, "/k", 3i64).unwrap();
    assert_eq!(graph.get::<i64>(root, "/k").unwrap(), 3);
}

// ============================================================================
// 2. Deterministic outcome regardless of write order
// ============================================================================

#[test]
fn test_core_outranks_plugin_both_orders() {
    // core writes first, plugin second: plugin is dropped
    let (mut graph, root, core, plugin) = arena();
    graph.set(core, root, "/cfg/mode", "core").unwrap();
    graph.set(plugin, root, "/cfg/mode", "plugin").unwrap();
    assert_eq!(graph.get::<String>(root, "/cfg/mode").unwrap(), "core");

    // plugin writes first, core second: core overwrites
    let (mut graph, root, core, plugin) = arena();
    graph.set(plugin, root, "/cfg/mode", "plugin").unwrap();
    graph.set(core, root, "/cfg/mode", "core").unwrap();
    assert_eq!(graph.get::<String>(root, "/cfg/mode").unwrap(), "core");
}

// ============================================================================
// 3. A dropped write is silent and leaves attribution intact
// ============================================================================

#[test]
fn test_dropped_write_keeps_value_and_attribution() {
    let (mut graph, root, core, plugin) = arena();
    graph.set(core, root, "/cfg/mode", "core").unwrap();

    // no error: the caller must inspect state to learn who won
    graph.set(plugin, root, "/cfg/mode", "plugin").unwrap();

    let node = graph.ensure_node(root, "/cfg/mode").unwrap();
    assert_eq!(graph.get::<String>(root, "/cfg/mode").unwrap(), "core");
    assert_eq!(graph.node(node).unwrap().setter(), Some(core));
}

// ============================================================================
// 4. forceWrite bypasses arbitration entirely
// ============================================================================

#[test]
fn test_force_write_wins() {
    let (mut graph, root, core, plugin) = arena();
    graph.set(core, root, "/cfg/mode", "core").unwrap();

    let now = *graph.time();
    graph.set_at(plugin, root, "/cfg/mode", Value::from("plugin"), now, true).unwrap();
    assert_eq!(graph.get::<String>(root, "/cfg/mode").unwrap(), "plugin");
}

// ============================================================================
// 5. First-time writes never consult the policy
// ============================================================================

#[test]
fn test_first_write_always_lands() {
    let (mut graph, root, _core, plugin) = arena();
    graph.set(plugin, root, "/cfg/fresh", 1i64).unwrap();
    assert_eq!(graph.get::<i64>(root, "/cfg/fresh").unwrap(), 1);
}

// ============================================================================
// 6. A setter freely overwrites its own values
// ============================================================================

#[test]
fn test_same_setter_overwrites_itself() {
    let (mut graph, root, core, _plugin) = arena();
    graph.set(core, root, "/cfg/mode", "one").unwrap();
    graph.set(core, root, "/cfg/mode", "two").unwrap();
    assert_eq!(graph.get::<String>(root, "/cfg/mode").unwrap(), "two");
}

// ============================================================================
// 7. Arbitration is decided when a scheduled change applies, not when
//    it is recorded
// ============================================================================

#[test]
fn test_scheduled_write_arbitrated_at_flush() {
    let (mut graph, root, core, plugin) = arena();

    // plugin schedules for t=10 while the key is still unowned
    graph.set_at(plugin, root, "/cfg/mode", Value::from("plugin"), 10, false).unwrap();
    // core takes the key before the flush
    graph.set(core, root, "/cfg/mode", "core").unwrap();

    graph.set_time(10).unwrap();
    assert_eq!(graph.get::<String>(root, "/cfg/mode").unwrap(), "core");
}

// ============================================================================
// 8. clear and remove honor the same rule
// ============================================================================

#[test]
fn test_clear_skips_outranked_children() {
    let (mut graph, root, core, plugin) = arena();
    let cfg = graph.ensure_node(root, "/cfg").unwrap();
    graph.set(core, root, "/cfg/a", 1i64).unwrap();
    graph.set(plugin, root, "/cfg/b", 2i64).unwrap();

    let removed = graph.clear(plugin, cfg, &NonNull).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(graph.get::<i64>(root, "/cfg/a").unwrap(), 1);
    assert_eq!(graph.find::<i64>(root, "/cfg/b").unwrap(), None);

    // core clears the rest
    let removed = graph.clear(core, cfg, &NonNull).unwrap();
    assert_eq!(removed, 1);
    assert!(graph.keys(cfg).unwrap().is_empty());
}

#[test]
fn test_remove_honors_policy() {
    let (mut graph, root, core, plugin) = arena();
    graph.set(core, root, "/cfg/mode", "core").unwrap();

    assert!(!graph.remove(plugin, root, "/cfg/mode").unwrap());
    assert_eq!(graph.get::<String>(root, "/cfg/mode").unwrap(), "core");

    assert!(graph.remove(core, root, "/cfg/mode").unwrap());
    assert_eq!(graph.find::<String>(root, "/cfg/mode").unwrap(), None);
}

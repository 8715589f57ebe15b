//! Arbitration policy and change notification — the two extension seams.

use crate::generator::PropertyValue;
use crate::graph::LogicalTime;
use crate::tree::NodeId;

// ============================================================================
// ArbitrationPolicy
// ============================================================================

/// Pure comparison between two setter identities.
///
/// Consulted only when a write would overwrite a value previously written
/// by a *different* setter, and never for forced writes. Returning `true`
/// means `setter` must yield: the write is silently dropped and the
/// incumbent value (and its attribution) is retained.
///
/// Swapping the policy changes the entire conflict-resolution behavior of
/// the tree without touching any other component.
pub trait ArbitrationPolicy: Send + Sync {
    fn lower_priority(&self, setter: NodeId, incumbent: NodeId) -> bool;
}

/// Any pure closure over two identities is a policy.
impl<F: Fn(NodeId, NodeId) -> bool + Send + Sync> ArbitrationPolicy for F {
    fn lower_priority(&self, setter: NodeId, incumbent: NodeId) -> bool {
        self(setter, incumbent)
    }
}

/// The default: no setter ever yields, so the last write wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriterWins;

impl ArbitrationPolicy for LastWriterWins {
    fn lower_priority(&self, _setter: NodeId, _incumbent: NodeId) -> bool {
        false
    }
}

// ============================================================================
// ChangeObserver
// ============================================================================

/// Notification hook invoked after every applied write.
///
/// `node` is the node written through, `key` the child that changed.
/// Removals (`clear`/`remove`) report `new = None`. Writes dropped by
/// arbitration are *not* reported, since nothing changed.
pub trait ChangeObserver<T: LogicalTime>: Send + Sync {
    fn on_change(
        &mut self,
        setter: NodeId,
        node: NodeId,
        key: &str,
        old: Option<&PropertyValue<T>>,
        new: Option<&PropertyValue<T>>,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_writer_wins_never_yields() {
        let policy = LastWriterWins;
        assert!(!policy.lower_priority(NodeId(1), NodeId(2)));
        assert!(!policy.lower_priority(NodeId(2), NodeId(1)));
    }

    #[test]
    fn test_closure_policy() {
        // lower id outranks higher id
        let policy = |setter: NodeId, incumbent: NodeId| setter.0 > incumbent.0;
        assert!(policy.lower_priority(NodeId(9), NodeId(1)));
        assert!(!policy.lower_priority(NodeId(1), NodeId(9)));
    }
}

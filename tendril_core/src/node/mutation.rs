// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural change records.
//!
//! Every child-list mutation on a [`NodeTree`](super::NodeTree) is appended
//! to the pending [`MutationRecord`] of the node whose children changed. The
//! runtime drains all pending records at once as a [`MutationBatch`], which is
//! the unit the lifecycle monitor reasons about: a node that leaves one parent
//! and joins another inside a single batch has *moved*, not been deleted.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use super::id::NodeId;

/// The child-list changes of one node since the last drained batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    /// The node whose direct children changed.
    pub target: NodeId,
    /// Children inserted under `target`, in insertion order.
    pub added: Vec<NodeId>,
    /// Children removed from `target`, in removal order.
    pub removed: Vec<NodeId>,
}

impl MutationRecord {
    pub(crate) fn new(target: NodeId) -> Self {
        Self {
            target,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// All structural changes accumulated between two deliveries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationBatch {
    /// One record per changed node, ordered by slot index.
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    /// Returns `true` if the batch carries no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns whether `node` was inserted anywhere in this batch.
    #[must_use]
    pub fn was_added(&self, node: NodeId) -> bool {
        self.records.iter().any(|r| r.added.contains(&node))
    }

    /// Returns whether `node` was removed from any parent in this batch.
    #[must_use]
    pub fn was_removed(&self, node: NodeId) -> bool {
        self.records.iter().any(|r| r.removed.contains(&node))
    }

    /// Iterates every removed node in record order, without duplicates.
    pub fn removed_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .flat_map(|r| r.removed.iter().copied())
            .filter(move |&n| seen.insert(n))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    fn id(idx: u32) -> NodeId {
        NodeId { idx, generation: 0 }
    }

    #[test]
    fn removed_nodes_are_deduplicated() {
        let batch = MutationBatch {
            records: vec![
                MutationRecord {
                    target: id(0),
                    added: vec![id(3)],
                    removed: vec![id(1), id(2), id(1)],
                },
                MutationRecord {
                    target: id(5),
                    added: Vec::new(),
                    removed: vec![id(2), id(4)],
                },
            ],
        };
        let removed: Vec<_> = batch.removed_nodes().collect();
        assert_eq!(removed, vec![id(1), id(2), id(4)]);
        assert!(batch.was_added(id(3)), "3 was inserted under 0");
        assert!(!batch.was_added(id(1)), "1 was only removed");
        assert!(batch.was_removed(id(4)), "4 was removed from 5");
    }
}

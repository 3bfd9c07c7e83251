// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::tree::NodeTree;

/// An iterator over the direct children of a node.
///
/// Created by [`NodeTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a NodeTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a NodeTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.handle(idx))
    }
}

/// A depth-first pre-order walk over the strict descendants of a node.
///
/// Created by [`NodeTree::descendants`]. Calling
/// [`skip_children`](Self::skip_children) after a node has been yielded
/// prunes that node's subtree from the rest of the walk, which is how the
/// locator finds *logical* children without visiting nested providers.
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a NodeTree,
    root: u32,
    last: u32,
    descend: bool,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(tree: &'a NodeTree, root: u32) -> Self {
        Self {
            tree,
            root,
            last: INVALID,
            descend: true,
        }
    }

    /// Prunes the subtree of the most recently yielded node.
    pub fn skip_children(&mut self) {
        self.descend = false;
    }

    fn advance(&self) -> u32 {
        let tree = self.tree;
        if self.last == INVALID {
            return tree.first_child[self.root as usize];
        }
        if self.descend && tree.first_child[self.last as usize] != INVALID {
            return tree.first_child[self.last as usize];
        }
        // Climb until a node with a next sibling is found, stopping at the root.
        let mut cur = self.last;
        while cur != self.root {
            let next = tree.next_sibling[cur as usize];
            if next != INVALID {
                return next;
            }
            cur = tree.parent[cur as usize];
        }
        INVALID
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.root == INVALID {
            return None;
        }
        let next = self.advance();
        if next == INVALID {
            self.root = INVALID;
            return None;
        }
        self.last = next;
        self.descend = true;
        Some(self.tree.handle(next))
    }
}

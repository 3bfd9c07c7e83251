// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, markers, and
//! structural change recording.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::{INVALID, NodeId};
use super::mutation::{MutationBatch, MutationRecord};
use super::traverse::{Children, Descendants};
use crate::context::{KindId, ProviderId};
use crate::dirty;

/// The payload of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    /// A structural node with a tag name (`"div"`, `"route"`, ...).
    Element(String),
    /// A leaf carrying text.
    Text(String),
}

/// Tags a node as the provider of one capability kind.
///
/// A node carries at most one marker per kind, but may carry markers for
/// several different kinds at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Marker {
    /// The context kind this node provides.
    pub kind: KindId,
    /// The registry entry holding the provided value.
    pub provider: ProviderId,
}

/// Struct-of-arrays storage for all nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct NodeTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Payload --
    pub(crate) data: Vec<NodeData>,
    pub(crate) attributes: Vec<BTreeMap<String, String>>,
    pub(crate) markers: Vec<Vec<Marker>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) live: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) live_count: u32,

    // -- Structural change tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    /// Pending records keyed by `(slot, generation)` of their target.
    pub(crate) pending: BTreeMap<(u32, u32), MutationRecord>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            data: Vec::new(),
            attributes: Vec::new(),
            markers: Vec::new(),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            live_count: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending: BTreeMap::new(),
        }
    }

    // -- Allocation API --

    /// Creates a detached element node.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.allocate(NodeData::Element(tag.into()))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.allocate(NodeData::Text(text.into()))
    }

    fn allocate(&mut self, data: NodeData) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.data[i] = data;
            self.attributes[i].clear();
            self.markers[i].clear();
            self.live[i] = true;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.data.push(data);
            self.attributes.push(BTreeMap::new());
            self.markers.push(Vec::new());
            self.generation.push(0);
            self.live.push(true);
            idx
        };
        self.live_count += 1;
        self.handle(idx)
    }

    /// Destroys a detached subtree, freeing every slot in it for reuse.
    ///
    /// Markers on destroyed nodes are dropped without touching the registry;
    /// callers reclaim providers first (see
    /// [`Runtime::destroy`](crate::Runtime::destroy)). Returns the number of
    /// destroyed nodes.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale or still attached to a parent.
    pub(crate) fn destroy_subtree(&mut self, root: NodeId) -> usize {
        self.validate(root);
        assert!(
            self.parent[root.idx as usize] == INVALID,
            "cannot destroy an attached node"
        );
        let mut doomed: Vec<u32> = Vec::new();
        doomed.push(root.idx);
        doomed.extend(self.descendants(root).map(|n| n.idx));
        for &idx in &doomed {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.markers[i].clear();
            self.attributes[i].clear();
            self.dirty.remove_key(idx);
            // Bump generation so old handles immediately fail validation.
            self.generation[i] += 1;
            self.live[i] = false;
            self.free_list.push(idx);
        }
        self.live_count -= doomed.len() as u32;
        doomed.len()
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.live[id.idx as usize]
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count as usize
    }

    /// Returns `true` if no node is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    // -- Topology API (records structural changes) --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `parent` lies inside `child`'s subtree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.contains(child, parent),
            "cannot insert a node into its own subtree"
        );
        self.link_last(parent.idx, child.idx);
        self.record(parent.idx).added.push(child);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, or the insertion would create a cycle.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        assert!(
            !self.contains(child, self.handle(p)),
            "cannot insert a node into its own subtree"
        );

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.record(p).added.push(child);
    }

    /// Removes `child` from its current parent.
    ///
    /// The node stays alive (and keeps its subtree) until the runtime decides
    /// it was durably detached.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "node has no parent");
        self.unlink_from_parent(c);
        self.record(p).removed.push(child);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first. Both halves are
    /// recorded, so within one batch the node reads as moved.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or the move would create a cycle.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.validate(child);
        self.validate(new_parent);
        assert!(
            !self.contains(child, new_parent),
            "cannot insert a node into its own subtree"
        );
        let old = self.parent[child.idx as usize];
        if old != INVALID {
            self.unlink_from_parent(child.idx);
            self.record(old).removed.push(child);
        }
        self.link_last(new_parent.idx, child.idx);
        self.record(new_parent.idx).added.push(child);
    }

    /// Replaces every child of `parent` with `children`, in order.
    ///
    /// Nodes in `children` that are attached elsewhere are moved.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale or a new child is an ancestor of
    /// `parent`.
    pub fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) {
        self.validate(parent);
        let p = parent.idx;
        while self.first_child[p as usize] != INVALID {
            let c = self.first_child[p as usize];
            self.unlink_from_parent(c);
            let handle = self.handle(c);
            self.record(p).removed.push(handle);
        }
        for &child in children {
            self.validate(child);
            let old = self.parent[child.idx as usize];
            if old != INVALID {
                self.unlink_from_parent(child.idx);
                self.record(old).removed.push(child);
            }
            assert!(
                !self.contains(child, parent),
                "cannot insert a node into its own subtree"
            );
            self.link_last(p, child.idx);
            self.record(p).added.push(child);
        }
    }

    /// Removes every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        self.replace_children(parent, &[]);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns the first child of a node, if any.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let c = self.first_child[id.idx as usize];
        (c != INVALID).then(|| self.handle(c))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children of a node.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Returns a pre-order walk over the strict descendants of a node.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx)
    }

    /// Returns the topmost ancestor of a node (the node itself if detached).
    #[must_use]
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.validate(id);
        let mut cur = id.idx;
        while self.parent[cur as usize] != INVALID {
            cur = self.parent[cur as usize];
        }
        self.handle(cur)
    }

    /// Returns whether `node` is `ancestor` or lies inside its subtree.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.validate(ancestor);
        self.validate(node);
        let mut cur = node.idx;
        loop {
            if cur == ancestor.idx {
                return true;
            }
            cur = self.parent[cur as usize];
            if cur == INVALID {
                return false;
            }
        }
    }

    // -- Payload API --

    /// Returns the payload of a node.
    #[must_use]
    pub fn data(&self, id: NodeId) -> &NodeData {
        self.validate(id);
        &self.data[id.idx as usize]
    }

    /// Returns the tag name if the node is an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Element(tag) => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    /// Returns the text if the node is a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    /// Replaces the text of a text node. Elements are left untouched.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.validate(id);
        if let NodeData::Text(current) = &mut self.data[id.idx as usize] {
            *current = text.into();
        }
    }

    /// Concatenates the text of every text node in the subtree, in document
    /// order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let NodeData::Text(text) = &self.data[node.idx as usize] {
                out.push_str(text);
            }
        }
        out
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.validate(id);
        self.attributes[id.idx as usize].get(name).map(String::as_str)
    }

    /// Sets an attribute value, returning the previous one.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.validate(id);
        self.attributes[id.idx as usize].insert(name.into(), value.into())
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.validate(id);
        self.attributes[id.idx as usize].remove(name)
    }

    // -- Marker API --

    /// Returns every marker on a node.
    #[must_use]
    pub fn markers(&self, id: NodeId) -> &[Marker] {
        self.validate(id);
        &self.markers[id.idx as usize]
    }

    /// Returns the provider a node holds for `kind`, if it is marked.
    #[must_use]
    pub fn marker(&self, id: NodeId, kind: KindId) -> Option<ProviderId> {
        self.validate(id);
        self.marker_at(id.idx, kind)
    }

    /// Attaches a marker. Returns `false` (and changes nothing) if the node
    /// already carries a marker of the same kind.
    pub(crate) fn add_marker(&mut self, id: NodeId, marker: Marker) -> bool {
        self.validate(id);
        let markers = &mut self.markers[id.idx as usize];
        if markers.iter().any(|m| m.kind == marker.kind) {
            return false;
        }
        markers.push(marker);
        true
    }

    /// Detaches the marker for `provider`, if present.
    pub(crate) fn remove_marker(&mut self, id: NodeId, provider: ProviderId) {
        if self.is_alive(id) {
            self.markers[id.idx as usize].retain(|m| m.provider != provider);
        }
    }

    /// Finds the nearest strict ancestor marked with `kind`.
    #[must_use]
    pub fn find_up(&self, id: NodeId, kind: KindId) -> Option<(NodeId, ProviderId)> {
        self.validate(id);
        let mut cur = self.parent[id.idx as usize];
        while cur != INVALID {
            if let Some(provider) = self.marker_at(cur, kind) {
                return Some((self.handle(cur), provider));
            }
            cur = self.parent[cur as usize];
        }
        None
    }

    /// Finds every strict descendant marked with `kind`, in document order.
    #[must_use]
    pub fn find_down(&self, id: NodeId, kind: KindId) -> Vec<(NodeId, ProviderId)> {
        self.descendants(id)
            .filter_map(|n| self.marker_at(n.idx, kind).map(|p| (n, p)))
            .collect()
    }

    /// Finds the marked descendants whose nearest marked ancestor of the same
    /// kind is `id`, in document order.
    ///
    /// Walks the subtree once and prunes below every hit, so nested providers
    /// are never visited.
    #[must_use]
    pub fn find_children(&self, id: NodeId, kind: KindId) -> Vec<(NodeId, ProviderId)> {
        let mut found = Vec::new();
        let mut walk = self.descendants(id);
        while let Some(node) = walk.next() {
            if let Some(provider) = self.marker_at(node.idx, kind) {
                found.push((node, provider));
                walk.skip_children();
            }
        }
        found
    }

    // -- Structural change API --

    /// Returns whether any structural change is waiting to be drained.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drains every pending record into a batch.
    ///
    /// Records are ordered by draining the TOPOLOGY dirty channel, so the
    /// order is deterministic regardless of mutation order.
    pub fn take_batch(&mut self) -> MutationBatch {
        let order: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        let mut pending = core::mem::take(&mut self.pending);
        let mut records = Vec::with_capacity(pending.len());
        for idx in order {
            let live = (idx, self.generation[idx as usize]);
            if let Some(record) = pending.remove(&live) {
                records.push(record);
            }
        }
        // Targets destroyed since they were recorded lost their dirty key.
        records.extend(pending.into_values());
        MutationBatch { records }
    }

    // -- Internal helpers --

    /// Builds a handle for a live slot.
    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn marker_at(&self, idx: u32, kind: KindId) -> Option<ProviderId> {
        self.markers[idx as usize]
            .iter()
            .find(|m| m.kind == kind)
            .map(|m| m.provider)
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Returns the pending record for `target`, creating it if needed.
    fn record(&mut self, target: u32) -> &mut MutationRecord {
        let handle = self.handle(target);
        self.dirty.mark(target, dirty::TOPOLOGY);
        self.pending
            .entry((handle.idx, handle.generation))
            .or_insert_with(|| MutationRecord::new(handle))
    }

    /// Appends `c` to the end of `p`'s child list.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from its parent's child list without recording.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

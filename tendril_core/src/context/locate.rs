// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Locator queries. All of them are read-only.

use alloc::rc::Rc;
use alloc::vec::Vec;

use super::kind::{Kind, ProviderId};
use crate::node::NodeId;
use crate::runtime::Runtime;

impl Runtime {
    /// Returns the value of the nearest strict ancestor providing `kind`.
    #[must_use]
    pub fn lookup_up<T: 'static>(&self, node: NodeId, kind: Kind<T>) -> Option<Rc<T>> {
        let (_, provider) = self.tree.find_up(node, kind.id())?;
        Some(self.registry.get(kind, provider))
    }

    /// Returns the values of every strict descendant providing `kind`, in
    /// document order.
    #[must_use]
    pub fn lookup_down<T: 'static>(&self, node: NodeId, kind: Kind<T>) -> Vec<Rc<T>> {
        self.tree
            .find_down(node, kind.id())
            .into_iter()
            .map(|(_, provider)| self.registry.get(kind, provider))
            .collect()
    }

    /// Resolves the nearest strict ancestor providing `anchor` (the root of
    /// `node`'s tree if there is none) and looks down from it.
    #[must_use]
    pub fn lookup_side<A: 'static, T: 'static>(
        &self,
        node: NodeId,
        anchor: Kind<A>,
        kind: Kind<T>,
    ) -> Vec<Rc<T>> {
        let from = self
            .anchor(node, anchor)
            .unwrap_or_else(|| self.tree.root_of(node));
        self.lookup_down(from, kind)
    }

    /// Returns the nearest strict ancestor providing `kind`.
    #[must_use]
    pub fn anchor<T: 'static>(&self, node: NodeId, kind: Kind<T>) -> Option<NodeId> {
        self.tree.find_up(node, kind.id()).map(|(n, _)| n)
    }

    /// Returns the logical children of `node` for `kind`: providers whose
    /// nearest providing ancestor of the same kind is `node`, in document
    /// order.
    ///
    /// Equivalent to filtering [`lookup_down`](Self::lookup_down) by
    /// `anchor(child, kind) == Some(node)`, without visiting nested providers.
    #[must_use]
    pub fn lookup_children<T: 'static>(&self, node: NodeId, kind: Kind<T>) -> Vec<Rc<T>> {
        self.tree
            .find_children(node, kind.id())
            .into_iter()
            .map(|(_, provider)| self.registry.get(kind, provider))
            .collect()
    }

    /// Returns the value `node` itself provides for `kind`.
    #[must_use]
    pub fn provided<T: 'static>(&self, node: NodeId, kind: Kind<T>) -> Option<Rc<T>> {
        let provider = self.tree.marker(node, kind.id())?;
        Some(self.registry.get(kind, provider))
    }

    /// Returns the provider id `node` holds for `kind`.
    #[must_use]
    pub fn provider_of<T: 'static>(&self, node: NodeId, kind: Kind<T>) -> Option<ProviderId> {
        self.tree.marker(node, kind.id())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::Runtime;

    #[test]
    fn lookup_up_takes_nearest_strict_ancestor() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<&'static str>(None);
        let leaf = rt.element("leaf", []);
        let inner = rt.element("inner", [leaf]);
        let outer = rt.element("outer", [inner]);
        rt.register(outer, kind, Some("outer")).unwrap();
        rt.register(inner, kind, Some("inner")).unwrap();
        rt.register(leaf, kind, Some("leaf")).unwrap();

        assert_eq!(rt.lookup_up(leaf, kind).as_deref(), Some(&"inner"));
        assert_eq!(rt.lookup_up(inner, kind).as_deref(), Some(&"outer"));
        assert!(rt.lookup_up(outer, kind).is_none(), "self is never included");
    }

    #[test]
    fn lookup_down_is_document_order_and_excludes_self() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let a1 = rt.element("a1", []);
        let a = rt.element("a", [a1]);
        let b = rt.element("b", []);
        let root = rt.element("root", [a, b]);
        for (n, v) in [(root, 0), (b, 3), (a1, 2), (a, 1)] {
            rt.register(n, kind, Some(v)).unwrap();
        }
        let found: Vec<u32> = rt.lookup_down(root, kind).iter().map(|v| **v).collect();
        assert_eq!(found, vec![1, 2, 3]);
        assert_eq!(found.len(), rt.registry().count_of(kind.id()) - 1);
    }

    #[test]
    fn lookup_side_falls_back_to_root() {
        let mut rt = Runtime::new();
        let group = rt.create_kind::<()>(Some(()));
        let item = rt.create_kind::<u32>(None);
        let x = rt.element("x", []);
        let y = rt.element("y", []);
        let wrapper = rt.element("wrapper", [y]);
        let root = rt.element("root", [x, wrapper]);
        rt.register(x, item, Some(1)).unwrap();
        rt.register(y, item, Some(2)).unwrap();

        // No group anywhere: the anchor is the detached root itself.
        let side: Vec<u32> = rt.lookup_side(y, group, item).iter().map(|v| **v).collect();
        assert_eq!(side, vec![1, 2]);

        rt.register(wrapper, group, None).unwrap();
        let side: Vec<u32> = rt.lookup_side(y, group, item).iter().map(|v| **v).collect();
        assert_eq!(side, vec![2], "anchored at the wrapper group");
        assert_eq!(rt.anchor(y, group), Some(wrapper));
        assert_eq!(rt.anchor(root, group), None);
    }

    #[test]
    fn lookup_children_skips_grandchildren() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let grandchild = rt.element("g", []);
        let child = rt.element("c", [grandchild]);
        let wrapper = rt.element("div", [child]);
        let sibling = rt.element("s", []);
        let parent = rt.element("p", [wrapper, sibling]);
        rt.register(parent, kind, Some(0)).unwrap();
        rt.register(child, kind, Some(1)).unwrap();
        rt.register(grandchild, kind, Some(2)).unwrap();
        rt.register(sibling, kind, Some(3)).unwrap();

        let direct: Vec<u32> = rt.lookup_children(parent, kind).iter().map(|v| **v).collect();
        assert_eq!(direct, vec![1, 3]);

        // Same answer as filtering the full downward lookup by anchor.
        let filtered: Vec<u32> = rt
            .tree()
            .find_down(parent, kind.id())
            .into_iter()
            .filter(|(n, _)| rt.anchor(*n, kind) == Some(parent))
            .map(|(_, p)| *rt.registry().get(kind, p))
            .collect();
        assert_eq!(direct, filtered);
    }

    #[test]
    fn one_node_can_provide_several_kinds() {
        let mut rt = Runtime::new();
        let numbers = rt.create_kind::<u32>(None);
        let names = rt.create_kind::<&'static str>(None);
        let node = rt.element("both", []);
        let leaf = rt.element("leaf", []);
        rt.append(node, leaf);
        rt.register(node, numbers, Some(5)).unwrap();
        rt.register(node, names, Some("five")).unwrap();
        assert_eq!(rt.lookup_up(leaf, numbers).as_deref(), Some(&5));
        assert_eq!(rt.lookup_up(leaf, names).as_deref(), Some(&"five"));
        assert!(rt.register(node, numbers, Some(6)).is_err());
    }
}

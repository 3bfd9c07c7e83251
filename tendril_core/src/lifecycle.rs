// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle monitor: reclaims registry entries of durably detached nodes.
//!
//! Observation of a provider starts in a deferred task queued by
//! [`Runtime::register`](crate::Runtime::register), once the subtree it was
//! built in has been linked into place. From then on the monitor reads every
//! [`MutationBatch`] the settle pass delivers:
//!
//! - A removed node that ends the batch **without** a parent is durably
//!   detached. Every provider on it, or anywhere in its subtree, is reclaimed
//!   exactly once and its reclaim hooks run.
//! - A removed node that ends the batch **with** a parent has moved. Its
//!   providers are kept and their watches follow it to the new parent.
//!
//! Nodes that never enter a structural change (built but never inserted,
//! or unlinked by writing to the arrays directly) are never reclaimed.
//!
//! Reclamation is decided from the batch alone. A provider deep inside a
//! detached subtree goes with it even though its own observed parent never
//! lost a child, and a provider detached before its watch task ran goes
//! too. Watches only record where each provider currently lives, for
//! [`LifecycleMonitor::observed_parent`] and the `watch` trace events.

use alloc::vec::Vec;

use crate::context::ProviderId;
use crate::node::{MutationBatch, NodeId};
use crate::runtime::Runtime;
use crate::trace::{BatchEvent, ReclaimEvent, WatchEvent};

#[derive(Clone, Copy, Debug)]
struct Watch {
    provider: ProviderId,
    node: NodeId,
    parent: NodeId,
}

/// Tracks which providers are under observation and where.
#[derive(Debug, Default)]
pub struct LifecycleMonitor {
    watches: Vec<Watch>,
}

impl LifecycleMonitor {
    /// Returns the number of providers under observation.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Returns whether `provider` is under observation.
    #[must_use]
    pub fn is_watching(&self, provider: ProviderId) -> bool {
        self.watches.iter().any(|w| w.provider == provider)
    }

    /// Returns the node whose child list is observed for `provider`.
    #[must_use]
    pub fn observed_parent(&self, provider: ProviderId) -> Option<NodeId> {
        self.watches
            .iter()
            .find(|w| w.provider == provider)
            .map(|w| w.parent)
    }

    fn forget(&mut self, provider: ProviderId) {
        self.watches.retain(|w| w.provider != provider);
    }
}

impl Runtime {
    /// Body of the deferred watch task queued by `register`.
    pub(crate) fn start_watch(&mut self, provider: ProviderId) {
        // Reclaimed (or destroyed) before the task ran.
        let Some(node) = self.registry.node(provider) else {
            return;
        };
        if !self.tree.is_alive(node) || self.monitor.is_watching(provider) {
            return;
        }
        let parent = self.tree.parent(node).unwrap_or(self.document);
        self.monitor.watches.push(Watch {
            provider,
            node,
            parent,
        });
        self.tracer().watch(&WatchEvent {
            provider,
            node,
            parent,
            moved: false,
        });
    }

    /// Applies one batch. Returns the number of reclaimed entries.
    pub(crate) fn deliver(&mut self, batch: &MutationBatch) -> usize {
        #[cfg(feature = "trace-rich")]
        self.tracer().mutations(&batch.records);

        let mut removed = 0;
        let mut detached = Vec::new();
        for node in batch.removed_nodes() {
            removed += 1;
            if self.tree.is_alive(node) && self.tree.parent(node).is_none() {
                detached.push(node);
            }
        }

        let mut reclaimed = 0;
        for &root in &detached {
            // An earlier root in this batch may have been destroyed with it.
            if self.tree.is_alive(root) {
                reclaimed += self.reclaim_subtree(root);
                if self.config.destroy_detached {
                    self.tree.destroy_subtree(root);
                }
            }
        }

        self.retarget_watches();

        self.tracer().batch(&BatchEvent {
            records: batch.records.len(),
            removed,
            detached: detached.len(),
            reclaimed,
        });
        reclaimed
    }

    /// Reclaims every provider in the subtree rooted at `root`.
    pub(crate) fn reclaim_subtree(&mut self, root: NodeId) -> usize {
        let mut providers: Vec<ProviderId> =
            self.tree.markers(root).iter().map(|m| m.provider).collect();
        for node in self.tree.descendants(root) {
            providers.extend(self.tree.markers(node).iter().map(|m| m.provider));
        }
        providers
            .into_iter()
            .filter(|&p| self.reclaim(p))
            .count()
    }

    /// Reclaims a single provider. Returns `false` if it was already gone.
    pub(crate) fn reclaim(&mut self, provider: ProviderId) -> bool {
        let Some(removed) = self.registry.remove(provider) else {
            return false;
        };
        self.tree.remove_marker(removed.node, provider);
        self.monitor.forget(provider);
        self.tracer().reclaim(&ReclaimEvent {
            provider,
            node: removed.node,
            kind: removed.kind,
            hooks: removed.hooks.len(),
        });
        for hook in removed.hooks {
            hook();
        }
        true
    }

    /// Points every watch at its node's current parent.
    fn retarget_watches(&mut self) {
        let mut moved = Vec::new();
        for watch in &mut self.monitor.watches {
            if !self.tree.is_alive(watch.node) {
                continue;
            }
            let Some(parent) = self.tree.parent(watch.node) else {
                continue;
            };
            if parent != watch.parent {
                watch.parent = parent;
                moved.push(*watch);
            }
        }
        for watch in moved {
            self.tracer().watch(&WatchEvent {
                provider: watch.provider,
                node: watch.node,
                parent: watch.parent,
                moved: true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use core::cell::Cell;

    use crate::{Runtime, RuntimeConfig};

    fn counter() -> (Rc<Cell<u32>>, Box<dyn FnOnce()>) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, Box::new(move || c.set(c.get() + 1)))
    }

    #[test]
    fn watch_starts_after_settle_on_eventual_parent() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let item = rt.element("li", []);
        let p = rt.register(item, kind, Some(1)).unwrap();
        // Still detached while the surrounding subtree is being built.
        let list = rt.element("ul", [item]);
        rt.mount([list]);
        assert!(!rt.monitor().is_watching(p));

        rt.settle();
        assert!(rt.monitor().is_watching(p));
        assert_eq!(rt.monitor().observed_parent(p), Some(list));
    }

    #[test]
    fn move_within_one_batch_is_not_a_delete() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let item = rt.element("li", []);
        let first = rt.element("ul", [item]);
        let second = rt.element("ul", []);
        rt.mount([first, second]);
        let p = rt.register(item, kind, Some(1)).unwrap();
        let (fired, hook) = counter();
        rt.on_reclaim(p, hook);
        rt.settle();

        // Detach and reattach before the next delivery.
        rt.remove(item);
        rt.append(second, item);
        let report = rt.settle();

        assert_eq!(report.reclaimed, 0);
        assert_eq!(fired.get(), 0);
        assert!(rt.registry().is_live(p));
        assert_eq!(rt.monitor().observed_parent(p), Some(second));
    }

    #[test]
    fn reordering_children_keeps_every_entry() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let a = rt.element("li", []);
        let b = rt.element("li", []);
        let c = rt.element("li", []);
        let list = rt.element("ul", [a, b, c]);
        rt.mount([list]);
        for (n, v) in [(a, 0), (b, 1), (c, 2)] {
            rt.register(n, kind, Some(v)).unwrap();
        }
        rt.settle();

        rt.replace_children(list, &[c, a, b]);
        let report = rt.settle();
        assert_eq!(report.reclaimed, 0);
        assert_eq!(rt.registry().count_of(kind.id()), 3);
    }

    #[test]
    fn durable_detach_reclaims_exactly_once() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let inner = rt.element("span", []);
        let item = rt.element("li", [inner]);
        let list = rt.element("ul", [item]);
        rt.mount([list]);
        let p_item = rt.register(item, kind, Some(1)).unwrap();
        let p_inner = rt.register(inner, kind, Some(2)).unwrap();
        let (fired, hook) = counter();
        rt.on_reclaim(p_item, hook);
        rt.settle();

        rt.remove(item);
        let report = rt.settle();
        assert_eq!(report.reclaimed, 2, "the subtree's providers go too");
        assert_eq!(fired.get(), 1);
        assert!(!rt.registry().is_live(p_item));
        assert!(!rt.registry().is_live(p_inner));
        assert!(!rt.tree().is_alive(item), "detached subtree is destroyed");
        assert_eq!(rt.monitor().watch_count(), 0);

        let again = rt.settle();
        assert_eq!(again.reclaimed, 0);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn detach_before_watch_still_reclaims() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let item = rt.element("li", []);
        let list = rt.element("ul", [item]);
        rt.mount([list]);
        let p = rt.register(item, kind, Some(1)).unwrap();
        rt.remove(item);

        let report = rt.settle();
        assert_eq!(report.reclaimed, 1);
        assert!(!rt.registry().is_live(p));
        assert!(!rt.monitor().is_watching(p), "observation ends with the reclaim");
    }

    #[test]
    fn watches_do_not_gate_reclamation() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let inner = rt.element("span", []);
        let item = rt.element("li", [inner]);
        let list = rt.element("ul", [item]);
        rt.mount([list]);
        let p = rt.register(inner, kind, Some(1)).unwrap();
        rt.settle();
        assert_eq!(rt.monitor().observed_parent(p), Some(item));

        // Only the document loses a child; `item` keeps `inner`.
        rt.remove(list);
        let report = rt.settle();
        assert_eq!(report.reclaimed, 1);
        assert!(!rt.registry().is_live(p));
        assert_eq!(rt.monitor().observed_parent(p), None);
    }

    #[test]
    fn never_inserted_nodes_are_not_reclaimed() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let orphan = rt.element("div", []);
        let p = rt.register(orphan, kind, Some(1)).unwrap();
        let report = rt.settle();
        assert_eq!(report.reclaimed, 0);
        assert!(rt.registry().is_live(p));
    }

    #[test]
    fn retained_detached_nodes_lose_only_their_markers() {
        let mut rt = Runtime::with_config(RuntimeConfig::retain_detached());
        let kind = rt.create_kind::<u32>(None);
        let item = rt.element("li", []);
        let list = rt.element("ul", [item]);
        rt.mount([list]);
        rt.register(item, kind, Some(1)).unwrap();
        rt.settle();

        rt.remove(item);
        rt.settle();
        assert!(rt.tree().is_alive(item));
        assert!(rt.tree().markers(item).is_empty());
    }

    #[test]
    fn explicit_destroy_reclaims_first() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let item = rt.element("li", []);
        let list = rt.element("ul", [item]);
        rt.mount([list]);
        let p = rt.register(item, kind, Some(1)).unwrap();
        let (fired, hook) = counter();
        rt.on_reclaim(p, hook);
        rt.settle();

        assert_eq!(rt.destroy(item), 1);
        assert_eq!(fired.get(), 1);
        assert!(!rt.tree().is_alive(item));
        assert_eq!(rt.tree().child_count(list), 0);
        let report = rt.settle();
        assert_eq!(report.reclaimed, 0, "the stale removal record is ignored");
    }
}

// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The application instance tying the tree, registry, and monitor together.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use crate::context::{ContextError, Kind, ProviderId, ReclaimHook, Registry};
use crate::lifecycle::LifecycleMonitor;
use crate::node::{Marker, NodeId, NodeTree};
use crate::schedule::{RuntimeConfig, TaskQueue};
use crate::trace::{RegisterEvent, TraceSink, Tracer};

/// Nodes produced by a render function, in order.
pub type Content = Vec<NodeId>;

/// One independent UI tree with its own registry and task queue.
///
/// Nothing is shared between runtimes, so tests can build as many as they
/// like side by side.
pub struct Runtime {
    pub(crate) tree: NodeTree,
    pub(crate) registry: Registry,
    pub(crate) monitor: LifecycleMonitor,
    pub(crate) queue: TaskQueue,
    pub(crate) config: RuntimeConfig,
    pub(crate) document: NodeId,
    services: BTreeMap<TypeId, Rc<dyn Any>>,
    sink: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("tree", &self.tree)
            .field("registry", &self.registry)
            .field("monitor", &self.monitor)
            .field("queue", &self.queue)
            .field("config", &self.config)
            .field("document", &self.document)
            .field("services", &self.services.len())
            .field("traced", &self.sink.is_some())
            .finish()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Creates a runtime with the default [`RuntimeConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::new())
    }

    /// Creates a runtime with the given configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut tree = NodeTree::new();
        let document = tree.create_element("document");
        Self {
            tree,
            registry: Registry::new(),
            monitor: LifecycleMonitor::default(),
            queue: TaskQueue::default(),
            config,
            document,
            services: BTreeMap::new(),
            sink: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> RuntimeConfig {
        self.config
    }

    /// Returns the document root every mounted tree hangs from.
    #[must_use]
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Returns the node tree.
    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Returns the node tree for direct mutation.
    ///
    /// Structural changes made through it are recorded like any other.
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// Returns the capability registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the lifecycle monitor.
    #[must_use]
    pub fn monitor(&self) -> &LifecycleMonitor {
        &self.monitor
    }

    // -- Tracing --

    /// Installs a trace sink, returning the previous one.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.sink.replace(sink)
    }

    /// Removes the trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.sink.take()
    }

    /// Returns a tracer over the installed sink.
    pub fn tracer(&mut self) -> Tracer<'_> {
        match self.sink.as_deref_mut() {
            Some(sink) => Tracer::new(sink),
            None => Tracer::none(),
        }
    }

    // -- Services --

    /// Stores an application-scoped service, replacing any previous one of
    /// the same type.
    pub fn insert_service<S: 'static>(&mut self, service: S) -> Rc<S> {
        let service = Rc::new(service);
        self.services
            .insert(TypeId::of::<S>(), Rc::clone(&service) as Rc<dyn Any>);
        service
    }

    /// Returns the service of type `S`, if one was inserted.
    #[must_use]
    pub fn service<S: 'static>(&self) -> Option<Rc<S>> {
        let service = self.services.get(&TypeId::of::<S>())?;
        Rc::downcast::<S>(Rc::clone(service)).ok()
    }

    // -- Building --

    /// Creates a detached element with the given children.
    pub fn element(
        &mut self,
        tag: impl Into<String>,
        children: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        let node = self.tree.create_element(tag);
        for child in children {
            self.tree.append_child(node, child);
        }
        node
    }

    /// Creates a detached text node.
    pub fn text(&mut self, text: impl Into<String>) -> NodeId {
        self.tree.create_text(text)
    }

    /// Appends `child` to `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.tree.append_child(parent, child);
    }

    /// Appends built content to the document root.
    pub fn mount(&mut self, content: impl IntoIterator<Item = NodeId>) {
        for node in content {
            self.tree.append_child(self.document, node);
        }
    }

    /// Replaces the children of `parent`.
    pub fn replace_children(&mut self, parent: NodeId, content: &[NodeId]) {
        self.tree.replace_children(parent, content);
    }

    /// Removes every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        self.tree.clear_children(parent);
    }

    /// Detaches `node` from its parent. Its providers are reclaimed at the
    /// next settle unless it is reinserted first.
    pub fn remove(&mut self, node: NodeId) {
        self.tree.remove_from_parent(node);
    }

    /// Reclaims every provider in `node`'s subtree, then detaches and
    /// destroys it immediately. Returns the number of reclaimed entries.
    pub fn destroy(&mut self, node: NodeId) -> usize {
        let reclaimed = self.reclaim_subtree(node);
        if self.tree.parent(node).is_some() {
            self.tree.remove_from_parent(node);
        }
        self.tree.destroy_subtree(node);
        reclaimed
    }

    // -- Context --

    /// Creates a context kind. See [`Registry::create_kind`].
    pub fn create_kind<T: 'static>(&mut self, default: Option<T>) -> Kind<T> {
        self.registry.create_kind(default)
    }

    /// Makes `node` a provider of `kind`.
    ///
    /// Stores `value` (or the kind's default), marks the node, and schedules
    /// lifecycle observation for the next settle.
    pub fn register<T: 'static>(
        &mut self,
        node: NodeId,
        kind: Kind<T>,
        value: Option<T>,
    ) -> Result<ProviderId, ContextError> {
        if self.tree.marker(node, kind.id()).is_some() {
            return Err(ContextError::AlreadyMarked {
                node,
                kind: kind.id(),
            });
        }
        let provider = self.registry.insert(kind, node, value)?;
        self.tree.add_marker(
            node,
            Marker {
                kind: kind.id(),
                provider,
            },
        );
        self.tracer().register(&RegisterEvent {
            provider,
            node,
            kind: kind.id(),
        });
        self.defer("watch", move |rt| {
            rt.start_watch(provider);
            Ok(())
        });
        Ok(provider)
    }

    /// Attaches a hook run once when `provider` is reclaimed.
    pub fn on_reclaim(&mut self, provider: ProviderId, hook: ReclaimHook) -> bool {
        self.registry.on_reclaim(provider, hook)
    }

    /// Returns the value of a live provider.
    ///
    /// # Panics
    ///
    /// Panics if the provider was reclaimed.
    #[must_use]
    pub fn capability<T: 'static>(&self, kind: Kind<T>, provider: ProviderId) -> Rc<T> {
        self.registry.get(kind, provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Theme(&'static str);

    #[test]
    fn services_are_keyed_by_type() {
        let mut rt = Runtime::new();
        assert!(rt.service::<Theme>().is_none());
        rt.insert_service(Theme("dark"));
        assert_eq!(*rt.service::<Theme>().unwrap(), Theme("dark"));
        rt.insert_service(Theme("light"));
        assert_eq!(rt.service::<Theme>().unwrap().0, "light");
    }

    #[test]
    fn mount_hangs_content_from_the_document() {
        let mut rt = Runtime::new();
        let hello = rt.text("hello");
        let p = rt.element("p", [hello]);
        rt.mount([p]);
        assert_eq!(rt.tree().parent(p), Some(rt.document()));
        assert_eq!(rt.tree().text_content(rt.document()), "hello");
        assert!(!rt.is_idle(), "the mount is pending delivery");
        rt.settle();
        assert!(rt.is_idle());
    }

    #[test]
    fn register_schedules_a_watch() {
        let mut rt = Runtime::new();
        let kind = rt.create_kind::<u32>(None);
        let node = rt.element("div", []);
        let p = rt.register(node, kind, Some(3)).unwrap();
        assert_eq!(rt.pending_tasks(), 1);
        assert_eq!(*rt.capability(kind, p), 3);
        assert_eq!(rt.provided(node, kind).as_deref(), Some(&3));
        assert_eq!(
            rt.register(node, kind, Some(4)),
            Err(ContextError::AlreadyMarked {
                node,
                kind: kind.id()
            })
        );
        assert_eq!(rt.registry().len(), 1, "the rejected value is not stored");
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_nodes_fail_loudly() {
        let mut rt = Runtime::new();
        let node = rt.element("div", []);
        rt.destroy(node);
        rt.append(rt.document(), node);
    }
}

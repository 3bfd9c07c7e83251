// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation-checked arena of capability values.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use super::error::ContextError;
use super::kind::{Kind, KindId, ProviderId};
use crate::node::NodeId;

/// A one-shot callback run when a provider is reclaimed.
pub type ReclaimHook = Box<dyn FnOnce()>;

struct KindInfo {
    name: &'static str,
    default: Option<Rc<dyn Any>>,
}

struct Entry {
    kind: KindId,
    node: NodeId,
    value: Rc<dyn Any>,
    hooks: Vec<ReclaimHook>,
}

/// What [`Registry::remove`] hands back to the lifecycle monitor.
pub(crate) struct Removed {
    pub(crate) kind: KindId,
    pub(crate) node: NodeId,
    pub(crate) hooks: Vec<ReclaimHook>,
}

/// Capability values keyed by [`ProviderId`].
///
/// Owned by a [`Runtime`](crate::Runtime), so independent runtimes never share
/// entries. Entries are inserted by
/// [`Runtime::register`](crate::Runtime::register) and removed only by the
/// lifecycle monitor.
#[derive(Default)]
pub struct Registry {
    kinds: Vec<KindInfo>,
    slots: Vec<Option<Entry>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    live: usize,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kinds", &self.kinds.len())
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new context kind whose providers expose values of type `T`.
    ///
    /// `default` is used by providers that register without a value of their
    /// own; every such provider shares the same default instance.
    pub fn create_kind<T: 'static>(&mut self, default: Option<T>) -> Kind<T> {
        let id = KindId(self.kinds.len() as u32);
        self.kinds.push(KindInfo {
            name: core::any::type_name::<T>(),
            default: default.map(|v| Rc::new(v) as Rc<dyn Any>),
        });
        Kind::new(id)
    }

    /// Returns the value type name of a kind.
    #[must_use]
    pub fn kind_name(&self, kind: KindId) -> &'static str {
        self.kinds[kind.0 as usize].name
    }

    /// Stores a value and returns its fresh provider id.
    pub(crate) fn insert<T: 'static>(
        &mut self,
        kind: Kind<T>,
        node: NodeId,
        value: Option<T>,
    ) -> Result<ProviderId, ContextError> {
        let value = match value {
            Some(v) => Rc::new(v) as Rc<dyn Any>,
            None => self.kinds[kind.id().0 as usize]
                .default
                .clone()
                .ok_or(ContextError::NoValue { kind: kind.id() })?,
        };
        let entry = Entry {
            kind: kind.id(),
            node,
            value,
            hooks: Vec::new(),
        };
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(entry);
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Some(entry));
            self.generation.push(0);
            idx
        };
        self.live += 1;
        Ok(ProviderId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Returns the value stored for `provider`.
    ///
    /// # Panics
    ///
    /// Panics if the provider was reclaimed, or belongs to another kind.
    #[must_use]
    pub fn get<T: 'static>(&self, kind: Kind<T>, provider: ProviderId) -> Rc<T> {
        let entry = self.entry(provider).unwrap_or_else(|| {
            panic!("stale ProviderId: {provider:?}");
        });
        assert!(
            entry.kind == kind.id(),
            "provider {provider} belongs to kind {} (not {})",
            entry.kind.0,
            kind.id().0
        );
        Self::downcast(entry)
    }

    /// Returns the value stored for `provider`, or `None` if it was reclaimed
    /// or belongs to another kind.
    #[must_use]
    pub fn try_get<T: 'static>(&self, kind: Kind<T>, provider: ProviderId) -> Option<Rc<T>> {
        let entry = self.entry(provider)?;
        (entry.kind == kind.id()).then(|| Self::downcast(entry))
    }

    /// Returns the node a live provider is attached to.
    #[must_use]
    pub fn node(&self, provider: ProviderId) -> Option<NodeId> {
        self.entry(provider).map(|e| e.node)
    }

    /// Returns the kind a live provider was registered under.
    #[must_use]
    pub fn kind_of(&self, provider: ProviderId) -> Option<KindId> {
        self.entry(provider).map(|e| e.kind)
    }

    /// Returns whether `provider` refers to a live entry.
    #[must_use]
    pub fn is_live(&self, provider: ProviderId) -> bool {
        self.entry(provider).is_some()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no entry is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns the number of live entries of one kind.
    #[must_use]
    pub fn count_of(&self, kind: KindId) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Attaches a hook run once when `provider` is reclaimed.
    ///
    /// Returns `false` (dropping the hook) if the provider is already gone.
    pub fn on_reclaim(&mut self, provider: ProviderId, hook: ReclaimHook) -> bool {
        match self.entry_mut(provider) {
            Some(entry) => {
                entry.hooks.push(hook);
                true
            }
            None => false,
        }
    }

    /// Frees a slot, returning what the caller needs to finish reclaiming.
    pub(crate) fn remove(&mut self, provider: ProviderId) -> Option<Removed> {
        self.entry(provider)?;
        let i = provider.idx as usize;
        let entry = self.slots[i].take()?;
        self.generation[i] += 1;
        self.free_list.push(provider.idx);
        self.live -= 1;
        Some(Removed {
            kind: entry.kind,
            node: entry.node,
            hooks: entry.hooks,
        })
    }

    fn entry(&self, provider: ProviderId) -> Option<&Entry> {
        let i = provider.idx as usize;
        if self.generation.get(i) != Some(&provider.generation) {
            return None;
        }
        self.slots[i].as_ref()
    }

    fn entry_mut(&mut self, provider: ProviderId) -> Option<&mut Entry> {
        let i = provider.idx as usize;
        if self.generation.get(i) != Some(&provider.generation) {
            return None;
        }
        self.slots[i].as_mut()
    }

    fn downcast<T: 'static>(entry: &Entry) -> Rc<T> {
        match Rc::downcast::<T>(Rc::clone(&entry.value)) {
            Ok(value) => value,
            Err(_) => unreachable!("kinds are created with a single value type"),
        }
    }
}

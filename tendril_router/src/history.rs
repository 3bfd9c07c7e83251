// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session history.
//!
//! The router reads the current path from a [`History`], pushes an entry for
//! every link-initiated navigation, and subscribes to *pop* events (back and
//! forward). [`MemoryHistory`] keeps the entries in memory, which is what
//! tests and headless hosts use.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tendril_core::Runtime;

use crate::error::RouterError;

/// Callback run on every pop event.
pub type PopListener = Rc<dyn Fn(&mut Runtime) -> Result<(), RouterError>>;

/// Identifies one pop subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// The session-history collaborator.
///
/// Methods take `&self`: a history is shared (behind an `Rc`) by the router
/// and by reclaim hooks that drop subscriptions.
pub trait History {
    /// Returns the path of the current entry.
    fn current_path(&self) -> String;

    /// Appends an entry and makes it current, discarding forward entries.
    /// Does not fire pop listeners.
    fn push_path(&self, path: &str);

    /// Moves one entry back. Returns `false` at the first entry.
    fn back(&self) -> bool;

    /// Moves one entry forward. Returns `false` at the last entry.
    fn forward(&self) -> bool;

    /// Subscribes to pop events.
    fn subscribe_pop(&self, listener: PopListener) -> ListenerId;

    /// Drops a subscription. Returns `false` if it was already gone.
    fn unsubscribe(&self, id: ListenerId) -> bool;

    /// Returns every live subscription, oldest first.
    fn listener_ids(&self) -> Vec<ListenerId>;

    /// Returns a live subscription's callback.
    fn listener(&self, id: ListenerId) -> Option<PopListener>;

    /// Returns the number of live subscriptions.
    fn listener_count(&self) -> usize {
        self.listener_ids().len()
    }
}

struct State {
    entries: Vec<String>,
    index: usize,
    listeners: BTreeMap<ListenerId, PopListener>,
    next_id: u64,
}

/// An in-memory [`History`].
pub struct MemoryHistory {
    state: RefCell<State>,
}

impl fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryHistory")
            .field("entries", &state.entries)
            .field("index", &state.index)
            .field("listeners", &state.listeners.len())
            .finish_non_exhaustive()
    }
}

impl MemoryHistory {
    /// Creates a history with a single entry.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(State {
                entries: vec![initial.into()],
                index: 0,
                listeners: BTreeMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Returns every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.state.borrow().entries.clone()
    }

    /// Returns the index of the current entry.
    #[must_use]
    pub fn index(&self) -> usize {
        self.state.borrow().index
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn current_path(&self) -> String {
        let state = self.state.borrow();
        state.entries[state.index].clone()
    }

    fn push_path(&self, path: &str) {
        let mut state = self.state.borrow_mut();
        let keep = state.index + 1;
        state.entries.truncate(keep);
        state.entries.push(path.to_owned());
        state.index = keep;
    }

    fn back(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.index == 0 {
            return false;
        }
        state.index -= 1;
        true
    }

    fn forward(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.index + 1 >= state.entries.len() {
            return false;
        }
        state.index += 1;
        true
    }

    fn subscribe_pop(&self, listener: PopListener) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.state.borrow_mut().listeners.remove(&id).is_some()
    }

    fn listener_ids(&self) -> Vec<ListenerId> {
        self.state.borrow().listeners.keys().copied().collect()
    }

    fn listener(&self, id: ListenerId) -> Option<PopListener> {
        self.state.borrow().listeners.get(&id).cloned()
    }

    fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> PopListener {
        Rc::new(|_: &mut Runtime| -> Result<(), RouterError> { Ok(()) })
    }

    #[test]
    fn push_truncates_forward_entries() {
        let h = MemoryHistory::new("/");
        h.push_path("/a");
        h.push_path("/b");
        assert!(h.back());
        assert_eq!(h.current_path(), "/a");
        h.push_path("/c");
        assert_eq!(h.entries(), ["/", "/a", "/c"]);
        assert!(!h.forward(), "forward entries were discarded");
    }

    #[test]
    fn back_and_forward_stop_at_the_ends() {
        let h = MemoryHistory::new("/");
        assert!(!h.back());
        h.push_path("/x");
        assert!(h.back());
        assert_eq!(h.index(), 0);
        assert!(h.forward());
        assert!(!h.forward());
        assert_eq!(h.current_path(), "/x");
    }

    #[test]
    fn subscriptions_are_counted() {
        let h = MemoryHistory::default();
        let a = h.subscribe_pop(noop());
        let b = h.subscribe_pop(noop());
        assert_eq!(h.listener_count(), 2);
        assert_eq!(h.listener_ids(), [a, b]);
        assert!(h.unsubscribe(a));
        assert!(!h.unsubscribe(a));
        assert!(h.listener(a).is_none());
        assert!(h.listener(b).is_some());
        assert_eq!(h.listener_count(), 1);
    }
}

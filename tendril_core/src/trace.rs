// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the runtime and the router built on it.
//!
//! This module provides a [`TraceSink`] trait with one method per observable
//! step: provider registration, lifecycle observation and reclamation, task
//! execution, mutation batch delivery, and the router's draw/clear/navigate
//! transitions. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates per-batch [`MutationRecord`]
//!   delivery to [`TraceSink::on_mutations`].

use alloc::rc::Rc;
use core::cell::{Ref, RefCell, RefMut};

use crate::context::{KindId, ProviderId};
#[cfg(feature = "trace-rich")]
use crate::node::MutationRecord;
use crate::node::NodeId;

// ---------------------------------------------------------------------------
// Runtime events
// ---------------------------------------------------------------------------

/// Emitted when a node becomes a provider.
#[derive(Clone, Copy, Debug)]
pub struct RegisterEvent {
    /// The new registry entry.
    pub provider: ProviderId,
    /// The marked node.
    pub node: NodeId,
    /// The kind it provides.
    pub kind: KindId,
}

/// Emitted when the lifecycle monitor starts (or retargets) observation.
#[derive(Clone, Copy, Debug)]
pub struct WatchEvent {
    /// The observed provider.
    pub provider: ProviderId,
    /// Its node.
    pub node: NodeId,
    /// The node whose child list is now observed.
    pub parent: NodeId,
    /// `true` when the node moved to a new parent within one batch.
    pub moved: bool,
}

/// Emitted when a registry entry is reclaimed.
#[derive(Clone, Copy, Debug)]
pub struct ReclaimEvent {
    /// The reclaimed entry.
    pub provider: ProviderId,
    /// The node it was attached to.
    pub node: NodeId,
    /// The kind it provided.
    pub kind: KindId,
    /// Number of reclaim hooks that ran.
    pub hooks: usize,
}

/// Emitted after a mutation batch has been delivered.
#[derive(Clone, Copy, Debug)]
pub struct BatchEvent {
    /// Number of changed parents.
    pub records: usize,
    /// Distinct removed nodes.
    pub removed: usize,
    /// Removed nodes that ended the batch without a parent.
    pub detached: usize,
    /// Entries reclaimed because of this batch.
    pub reclaimed: usize,
}

/// Emitted after a deferred task ran.
#[derive(Clone, Copy, Debug)]
pub struct TaskEvent {
    /// Queue sequence number (first scheduled, first run).
    pub seq: u64,
    /// Static label given at scheduling time.
    pub label: &'static str,
    /// Whether the task returned `Ok`.
    pub ok: bool,
}

/// Summary of one [`Runtime::settle`](crate::Runtime::settle) call.
#[derive(Clone, Copy, Debug)]
pub struct SettleSummary {
    /// Rounds executed.
    pub rounds: u32,
    /// Tasks run across all rounds.
    pub tasks_run: u32,
    /// Mutation batches delivered.
    pub batches: u32,
    /// Entries reclaimed.
    pub reclaimed: u32,
    /// Tasks that returned an error.
    pub failures: usize,
    /// `true` if work was still pending when the round limit was hit.
    pub exhausted: bool,
}

// ---------------------------------------------------------------------------
// Router events
// ---------------------------------------------------------------------------

/// Emitted when a route draws (or re-confirms) its content.
#[derive(Clone, Copy, Debug)]
pub struct DrawEvent<'a> {
    /// The route's node.
    pub route: NodeId,
    /// The route's own pattern source.
    pub pattern: &'a str,
    /// The path remaining after this route's match.
    pub remaining: &'a str,
    /// `false` when the parameters were unchanged and nothing was rendered.
    pub rerendered: bool,
}

/// Emitted when a route's content is cleared.
#[derive(Clone, Copy, Debug)]
pub struct ClearEvent<'a> {
    /// The route's node.
    pub route: NodeId,
    /// The route's own pattern source.
    pub pattern: &'a str,
    /// History listeners dropped by descendant links.
    pub unsubscribed: usize,
}

/// Emitted when a path segment matched no route.
#[derive(Clone, Copy, Debug)]
pub struct NotFoundEvent<'a> {
    /// The route that ran the cascade step.
    pub route: NodeId,
    /// The unmatched remainder.
    pub path: &'a str,
    /// `false` when the cascade ended at the top without a renderer.
    pub handled: bool,
}

/// Emitted for each route a navigation request visits.
#[derive(Clone, Copy, Debug)]
pub struct NavigateEvent<'a> {
    /// The route handling the request.
    pub route: NodeId,
    /// The absolute target path.
    pub target: &'a str,
    /// The route's fully-qualified pattern.
    pub qualified: &'a str,
    /// `true` for the link-initiated request, `false` when bubbled up.
    pub originating: bool,
    /// Whether the qualified pattern matched the target.
    pub matched: bool,
}

/// Emitted when a route elects itself as the navigation root.
#[derive(Clone, Copy, Debug)]
pub struct RootElectedEvent<'a> {
    /// The root route's node.
    pub route: NodeId,
    /// The path of the first draw.
    pub path: &'a str,
}

/// Emitted when a link re-evaluates its active state.
#[derive(Clone, Copy, Debug)]
pub struct LinkRefreshEvent<'a> {
    /// The link's node.
    pub link: NodeId,
    /// The link target.
    pub to: &'a str,
    /// Whether it is now active.
    pub active: bool,
    /// Whether the state flipped (and the link re-rendered).
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the runtime and router.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a provider is registered.
    fn on_register(&mut self, e: &RegisterEvent) {
        _ = e;
    }

    /// Called when observation of a provider starts or is retargeted.
    fn on_watch(&mut self, e: &WatchEvent) {
        _ = e;
    }

    /// Called when a provider is reclaimed.
    fn on_reclaim(&mut self, e: &ReclaimEvent) {
        _ = e;
    }

    /// Called after a mutation batch is delivered.
    fn on_batch(&mut self, e: &BatchEvent) {
        _ = e;
    }

    /// Called after a deferred task ran.
    fn on_task(&mut self, e: &TaskEvent) {
        _ = e;
    }

    /// Called at the end of a settle call.
    fn on_settle(&mut self, s: &SettleSummary) {
        _ = s;
    }

    /// Called when a route draws.
    fn on_draw(&mut self, e: &DrawEvent<'_>) {
        _ = e;
    }

    /// Called when a route is cleared.
    fn on_clear(&mut self, e: &ClearEvent<'_>) {
        _ = e;
    }

    /// Called for each step of the not-found cascade.
    fn on_not_found(&mut self, e: &NotFoundEvent<'_>) {
        _ = e;
    }

    /// Called for each route a navigation request visits.
    fn on_navigate(&mut self, e: &NavigateEvent<'_>) {
        _ = e;
    }

    /// Called when the navigation root is elected.
    fn on_root_elected(&mut self, e: &RootElectedEvent<'_>) {
        _ = e;
    }

    /// Called when a link re-evaluates its active state.
    fn on_link_refresh(&mut self, e: &LinkRefreshEvent<'_>) {
        _ = e;
    }

    /// Called with the records of each delivered batch (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_mutations(&mut self, records: &[MutationRecord]) {
        _ = records;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// SharedSink
// ---------------------------------------------------------------------------

/// A cloneable handle to a sink installed on a runtime.
///
/// [`Runtime::set_trace_sink`](crate::Runtime::set_trace_sink) takes
/// ownership of its sink. Install one clone and keep another to read the
/// collected data while the runtime is still alive.
pub struct SharedSink<S> {
    inner: Rc<RefCell<S>>,
}

impl<S> SharedSink<S> {
    /// Wraps `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(sink)),
        }
    }

    /// Borrows the wrapped sink.
    ///
    /// # Panics
    ///
    /// Panics if called from inside one of the sink's own callbacks.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, S> {
        self.inner.borrow()
    }

    /// Mutably borrows the wrapped sink.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, S> {
        self.inner.borrow_mut()
    }
}

impl<S> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> core::fmt::Debug for SharedSink<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedSink")
            .field("handles", &Rc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

impl<S: TraceSink> TraceSink for SharedSink<S> {
    fn on_register(&mut self, e: &RegisterEvent) {
        self.inner.borrow_mut().on_register(e);
    }

    fn on_watch(&mut self, e: &WatchEvent) {
        self.inner.borrow_mut().on_watch(e);
    }

    fn on_reclaim(&mut self, e: &ReclaimEvent) {
        self.inner.borrow_mut().on_reclaim(e);
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.inner.borrow_mut().on_batch(e);
    }

    fn on_task(&mut self, e: &TaskEvent) {
        self.inner.borrow_mut().on_task(e);
    }

    fn on_settle(&mut self, s: &SettleSummary) {
        self.inner.borrow_mut().on_settle(s);
    }

    fn on_draw(&mut self, e: &DrawEvent<'_>) {
        self.inner.borrow_mut().on_draw(e);
    }

    fn on_clear(&mut self, e: &ClearEvent<'_>) {
        self.inner.borrow_mut().on_clear(e);
    }

    fn on_not_found(&mut self, e: &NotFoundEvent<'_>) {
        self.inner.borrow_mut().on_not_found(e);
    }

    fn on_navigate(&mut self, e: &NavigateEvent<'_>) {
        self.inner.borrow_mut().on_navigate(e);
    }

    fn on_root_elected(&mut self, e: &RootElectedEvent<'_>) {
        self.inner.borrow_mut().on_root_elected(e);
    }

    fn on_link_refresh(&mut self, e: &LinkRefreshEvent<'_>) {
        self.inner.borrow_mut().on_link_refresh(e);
    }

    #[cfg(feature = "trace-rich")]
    fn on_mutations(&mut self, records: &[MutationRecord]) {
        self.inner.borrow_mut().on_mutations(records);
    }
}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! emit {
    ($(#[$doc:meta])* $name:ident, $method:ident, $ty:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    emit!(
        /// Emits a [`RegisterEvent`].
        register, on_register, RegisterEvent
    );
    emit!(
        /// Emits a [`WatchEvent`].
        watch, on_watch, WatchEvent
    );
    emit!(
        /// Emits a [`ReclaimEvent`].
        reclaim, on_reclaim, ReclaimEvent
    );
    emit!(
        /// Emits a [`BatchEvent`].
        batch, on_batch, BatchEvent
    );
    emit!(
        /// Emits a [`TaskEvent`].
        task, on_task, TaskEvent
    );
    emit!(
        /// Emits a [`SettleSummary`].
        settle, on_settle, SettleSummary
    );
    emit!(
        /// Emits a [`DrawEvent`].
        draw, on_draw, DrawEvent<'_>
    );
    emit!(
        /// Emits a [`ClearEvent`].
        clear, on_clear, ClearEvent<'_>
    );
    emit!(
        /// Emits a [`NotFoundEvent`].
        not_found, on_not_found, NotFoundEvent<'_>
    );
    emit!(
        /// Emits a [`NavigateEvent`].
        navigate, on_navigate, NavigateEvent<'_>
    );
    emit!(
        /// Emits a [`RootElectedEvent`].
        root_elected, on_root_elected, RootElectedEvent<'_>
    );
    emit!(
        /// Emits a [`LinkRefreshEvent`].
        link_refresh, on_link_refresh, LinkRefreshEvent<'_>
    );

    /// Emits the records of a delivered batch (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn mutations(&mut self, records: &[MutationRecord]) {
        if let Some(s) = &mut self.sink {
            s.on_mutations(records);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree, tree-scoped context, and lifecycle monitoring for a runtime
//! whose live UI tree *is* the application state.
//!
//! `tendril_core` is `no_std` compatible (with `alloc`). Nodes live in
//! struct-of-arrays storage behind generational handles, so a handle to a
//! destroyed node fails loudly instead of aliasing a new one.
//!
//! # Architecture
//!
//! ```text
//!   build (element / text / register)
//!       │
//!       ▼
//!   NodeTree ──► MutationRecord per changed parent
//!       │                    │
//!       │        Runtime::settle()
//!       │          ├─ deferred tasks (watch, root election, ...)
//!       │          └─ MutationBatch ──► lifecycle monitor ──► reclaim
//!       ▼
//!   locator (lookup_up / lookup_down / lookup_side / lookup_children)
//! ```
//!
//! **[`node`]**: Struct-of-arrays tree with generational handles, markers,
//! and structural change records.
//!
//! **[`context`]**: Typed context kinds and the generation-checked
//! [`Registry`](context::Registry) of capability values. Locator queries are
//! methods on [`Runtime`].
//!
//! **[`lifecycle`]**: Reclaims a provider exactly once when its node is
//! durably detached. A move inside one batch is not a detach.
//!
//! **[`schedule`]**: Deferred tasks and the explicit two-phase
//! [`settle`](Runtime::settle) pass.
//!
//! **[`dirty`]**: Dirty channel used to order structural change records.
//!
//! **[`state`]**: Typed get/set accessors for application state kept in the
//! tree itself (text, numbers, flags, live child lists).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Example
//!
//! ```
//! use tendril_core::Runtime;
//!
//! let mut rt = Runtime::new();
//! let theme = rt.create_kind::<&'static str>(None);
//!
//! let button = rt.element("button", []);
//! let panel = rt.element("panel", [button]);
//! rt.register(panel, theme, Some("dark")).unwrap();
//! rt.mount([panel]);
//! rt.settle();
//!
//! assert_eq!(rt.lookup_up(button, theme).as_deref(), Some(&"dark"));
//!
//! rt.remove(panel);
//! let report = rt.settle();
//! assert_eq!(report.reclaimed, 1);
//! ```
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-batch
//!   mutation record events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod context;
pub mod dirty;
pub mod lifecycle;
pub mod node;
pub mod schedule;
pub mod state;
pub mod trace;

mod runtime;

pub use runtime::{Content, Runtime};
pub use schedule::{RuntimeConfig, SettleReport, Task, TaskError};

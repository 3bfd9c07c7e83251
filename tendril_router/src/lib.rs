// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical routing and link navigation on top of `tendril_core`.
//!
//! Routes and links are ordinary nodes that provide a capability through the
//! tree-scoped registry. The router never keeps a tree of its own: a route's
//! parent is whatever [`lookup_up`](tendril_core::Runtime::lookup_up) finds,
//! and its children are whatever
//! [`lookup_children`](tendril_core::Runtime::lookup_children) finds, at the
//! moment of asking.
//!
//! ```text
//!  History ──pop──► root route ──draw──► child routes ──draw──► ...
//!     ▲                 ▲
//!     │ push            │ navigate (bubbles up until a pattern matches)
//!     └──────────── Link::activate
//! ```
//!
//! # Setup
//!
//! Call [`Router::install`] once per [`Runtime`](tendril_core::Runtime) with a
//! [`History`] implementation. Build routes with [`Route`] and links with
//! [`Link`], link the returned nodes wherever they belong, and call
//! [`settle`](tendril_core::Runtime::settle). The top-level route elects
//! itself navigation root during that settle and draws the current path.
//!
//! # Features
//!
//! - `trace`: forwards router events (draw, clear, navigate, not-found, link
//!   refresh) to the runtime's trace sink.

mod error;
mod history;
mod link;
mod pattern;
mod route;
mod router;

pub use error::{PatternError, RouterError};
pub use history::{History, ListenerId, MemoryHistory, PopListener};
pub use link::{Link, LinkCapability, LinkRenderFn, LinkView};
pub use pattern::{Params, PathMatch, Pattern};
pub use route::{NotFoundFn, RenderFn, Route, RouteCapability, RouteState};
pub use router::Router;

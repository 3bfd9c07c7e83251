// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree-scoped capability propagation.
//!
//! A *provider* node publishes a value under a context [`Kind`]. The value is
//! stored in the [`Registry`] under a fresh [`ProviderId`], and the node is
//! tagged with a [`Marker`](crate::node::Marker) naming the kind and provider.
//! Consumers then resolve the value relative to any node:
//!
//! - [`lookup_up`](crate::Runtime::lookup_up): nearest strict ancestor.
//! - [`lookup_down`](crate::Runtime::lookup_down): every strict descendant,
//!   in document order.
//! - [`lookup_side`](crate::Runtime::lookup_side): everything under the
//!   nearest ancestor of an anchor kind (or the root when there is none).
//! - [`lookup_children`](crate::Runtime::lookup_children): descendants whose
//!   nearest provider of the same kind is the starting node.
//!
//! Absence is always `None` or an empty list, never an error. Entries are
//! reclaimed by the lifecycle monitor once their node is durably detached.

mod error;
mod kind;
mod locate;
mod registry;

pub use error::ContextError;
pub use kind::{Kind, KindId, ProviderId};
pub use registry::{ReclaimHook, Registry};

// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree data model.
//!
//! A *node* is either an element (a tag plus attributes) or a text leaf. Each
//! node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed, so use-after-free bugs panic at the API level.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - **Markers** naming the context kinds the node provides (see
//!   [`context`](crate::context)).
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.
//!
//! # Structural changes
//!
//! Every child-list mutation is recorded against the node whose children
//! changed and marks the TOPOLOGY dirty channel (see [`dirty`](crate::dirty)).
//! [`NodeTree::take_batch`] drains the records as one [`MutationBatch`].

mod id;
mod mutation;
mod traverse;
mod tree;

pub use id::{INVALID, NodeId};
pub use mutation::{MutationBatch, MutationRecord};
pub use traverse::{Children, Descendants};
pub use tree::{Marker, NodeData, NodeTree};

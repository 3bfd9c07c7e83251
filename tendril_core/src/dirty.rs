// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Structural changes are tracked with [`understory_dirty`]. Only one channel
//! exists today: [`TOPOLOGY`] is marked on the node whose child list changed,
//! and is local-only (it never propagates to descendants).
//!
//! Callers never query dirty state directly.
//! [`NodeTree::take_batch`](crate::node::NodeTree::take_batch) drains the
//! channel to order the [`MutationBatch`](crate::node::MutationBatch) it
//! returns.

use understory_dirty::Channel;

/// A node's child list changed.
pub const TOPOLOGY: Channel = Channel::new(0);

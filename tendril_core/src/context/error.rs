// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use super::kind::KindId;
use crate::node::NodeId;

/// Errors returned when registering a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextError {
    /// The node already carries a marker of this kind.
    AlreadyMarked {
        /// The node that was asked to provide twice.
        node: NodeId,
        /// The kind it already provides.
        kind: KindId,
    },
    /// No value was supplied and the kind has no default.
    NoValue {
        /// The kind being registered.
        kind: KindId,
    },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyMarked { node, kind } => {
                write!(f, "node {node} already provides kind {}", kind.index())
            }
            Self::NoValue { kind } => {
                write!(f, "no value supplied for kind {} and it has no default", kind.index())
            }
        }
    }
}

impl core::error::Error for ContextError {}

// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::error::Error;
use std::fmt;

use tendril_core::context::ContextError;
use tendril_core::node::NodeId;

/// Errors produced while compiling a path pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternError {
    /// A `:name` segment whose name is not an identifier.
    InvalidParam {
        /// The full pattern.
        path: String,
        /// The offending name (possibly empty).
        name: String,
    },
    /// The same parameter name appears twice in one pattern.
    DuplicateParam {
        /// The full pattern.
        path: String,
        /// The repeated name.
        name: String,
    },
    /// The generated expression was rejected by the regex engine.
    Regex(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParam { path, name } => {
                write!(f, "invalid parameter name {name:?} in pattern {path:?}")
            }
            Self::DuplicateParam { path, name } => {
                write!(f, "parameter {name:?} appears twice in pattern {path:?}")
            }
            Self::Regex(msg) => write!(f, "pattern did not compile: {msg}"),
        }
    }
}

impl Error for PatternError {}

/// Errors produced by routes, links, and the router service.
#[derive(Debug)]
pub enum RouterError {
    /// A route pattern failed to compile.
    Pattern(PatternError),
    /// Registering a route or link provider failed.
    Context(ContextError),
    /// [`Router::install`](crate::Router::install) was never called on this
    /// runtime.
    NotInstalled,
    /// A link was activated outside of any route.
    NoEnclosingRoute(NodeId),
    /// The node is not a link.
    NotALink(NodeId),
    /// A render function failed.
    Render(Box<dyn Error>),
    /// A render function returned a node that has already been destroyed.
    StaleContent(NodeId),
}

impl RouterError {
    /// Wraps an application error raised inside a render function.
    pub fn render(err: impl Error + 'static) -> Self {
        Self::Render(Box::new(err))
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(err) => write!(f, "{err}"),
            Self::Context(err) => write!(f, "{err}"),
            Self::NotInstalled => f.write_str("router is not installed on this runtime"),
            Self::NoEnclosingRoute(node) => write!(f, "link {node} is not inside a route"),
            Self::NotALink(node) => write!(f, "node {node} is not a link"),
            Self::Render(err) => write!(f, "render failed: {err}"),
            Self::StaleContent(node) => {
                write!(f, "render returned destroyed node {node}; build content fresh")
            }
        }
    }
}

impl Error for RouterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pattern(err) => Some(err),
            Self::Context(err) => Some(err),
            Self::Render(err) => Some(err.as_ref()),
            Self::NotInstalled
            | Self::NoEnclosingRoute(_)
            | Self::NotALink(_)
            | Self::StaleContent(_) => None,
        }
    }
}

impl From<PatternError> for RouterError {
    fn from(err: PatternError) -> Self {
        Self::Pattern(err)
    }
}

impl From<ContextError> for RouterError {
    fn from(err: ContextError) -> Self {
        Self::Context(err)
    }
}

// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;
use std::rc::Rc;

use tendril_core::Runtime;
use tendril_core::context::Kind;

use crate::error::RouterError;
use crate::history::History;
use crate::link::LinkCapability;
use crate::route::RouteCapability;

/// Application-scoped router state: the route and link context kinds and the
/// session history.
///
/// Stored as a [`Runtime`] service by [`install`](Self::install) and fetched
/// with [`get`](Self::get).
pub struct Router {
    route_kind: Kind<RouteCapability>,
    link_kind: Kind<LinkCapability>,
    history: Rc<dyn History>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("route_kind", &self.route_kind)
            .field("link_kind", &self.link_kind)
            .field("current_path", &self.history.current_path())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates the route and link kinds and stores the router on `rt`.
    pub fn install(rt: &mut Runtime, history: Rc<dyn History>) -> Rc<Self> {
        let route_kind = rt.create_kind::<RouteCapability>(None);
        let link_kind = rt.create_kind::<LinkCapability>(None);
        rt.insert_service(Self {
            route_kind,
            link_kind,
            history,
        })
    }

    /// Returns the router installed on `rt`.
    pub fn get(rt: &Runtime) -> Result<Rc<Self>, RouterError> {
        rt.service::<Self>().ok_or(RouterError::NotInstalled)
    }

    /// The context kind route nodes provide.
    #[must_use]
    pub fn route_kind(&self) -> Kind<RouteCapability> {
        self.route_kind
    }

    /// The context kind link nodes provide.
    #[must_use]
    pub fn link_kind(&self) -> Kind<LinkCapability> {
        self.link_kind
    }

    /// The session history.
    #[must_use]
    pub fn history(&self) -> &Rc<dyn History> {
        &self.history
    }

    /// Delivers a pop event to every listener still subscribed when its turn
    /// comes. A listener dropped by an earlier one in the same dispatch is
    /// skipped.
    pub fn dispatch_pop(rt: &mut Runtime) -> Result<(), RouterError> {
        let router = Self::get(rt)?;
        for id in router.history.listener_ids() {
            if let Some(listener) = router.history.listener(id) {
                listener(rt)?;
            }
        }
        Ok(())
    }

    /// Moves history back one entry and dispatches the pop event.
    ///
    /// Returns `false` (and dispatches nothing) at the first entry.
    pub fn back(rt: &mut Runtime) -> Result<bool, RouterError> {
        let router = Self::get(rt)?;
        if !router.history.back() {
            return Ok(false);
        }
        Self::dispatch_pop(rt)?;
        Ok(true)
    }

    /// Moves history forward one entry and dispatches the pop event.
    pub fn forward(rt: &mut Runtime) -> Result<bool, RouterError> {
        let router = Self::get(rt)?;
        if !router.history.forward() {
            return Ok(false);
        }
        Self::dispatch_pop(rt)?;
        Ok(true)
    }

    /// Navigates from the first top-level route, recording a history entry,
    /// then refreshes every link.
    ///
    /// Without any mounted route only the history entry is recorded.
    pub fn navigate(rt: &mut Runtime, target: &str) -> Result<(), RouterError> {
        let router = Self::get(rt)?;
        let top = rt.lookup_children(rt.document(), router.route_kind);
        match top.first() {
            Some(route) => route.navigate(rt, target, true)?,
            None => router.history.push_path(target),
        }
        Self::refresh_links(rt)
    }

    /// Asks every link under the document to re-evaluate its active state.
    pub fn refresh_links(rt: &mut Runtime) -> Result<(), RouterError> {
        let router = Self::get(rt)?;
        for link in rt.lookup_down(rt.document(), router.link_kind) {
            if rt.tree().is_alive(link.node()) {
                link.refresh(rt)?;
            }
        }
        Ok(())
    }
}

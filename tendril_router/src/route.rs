// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route nodes and their draw/clear/navigate state machine.
//!
//! A route is an element (`<route>`) providing a [`RouteCapability`]. Its
//! rendered content hangs directly under that element, which is why it is
//! called the route's *head*. Parent/child relationships between routes are
//! never stored: every pass rediscovers the logical children through the
//! locator, so moving nodes around can never leave a stale route tree behind.
//!
//! ```text
//!   Unmounted ──draw──► Stale ──render ok──► Idle
//!       ▲                 ▲                   │
//!       │                 └──params changed───┤
//!       └──────────────────clear──────────────┤
//!                                             ▼
//!                         NotFound ◄──own not-found renderer
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tendril_core::node::NodeId;
use tendril_core::trace::{ClearEvent, DrawEvent, NavigateEvent, NotFoundEvent, RootElectedEvent};
use tendril_core::{Content, Runtime};

use crate::error::RouterError;
use crate::history::{ListenerId, PopListener};
use crate::pattern::{Params, Pattern};
use crate::router::Router;

/// Renders a route's content for the matched parameters.
///
/// The returned nodes become the route's children. Build them inside the
/// function on every call: content a route drops (on clear, or when
/// not-found content replaces it) is destroyed at the next settle, and
/// returning a destroyed node fails with [`RouterError::StaleContent`].
pub type RenderFn = Rc<dyn Fn(&mut Runtime, &Params) -> Result<Content, RouterError>>;

/// Renders the not-found content for an unmatched path remainder.
pub type NotFoundFn = Rc<dyn Fn(&mut Runtime, &str) -> Result<Content, RouterError>>;

/// Where a route is in its draw cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteState {
    /// Nothing drawn.
    Unmounted,
    /// Drawn, and matching the current path fragment.
    Idle,
    /// Re-rendering because the matched parameters changed.
    Stale,
    /// Showing its own not-found content.
    NotFound,
}

/// The capability a route node provides.
pub struct RouteCapability {
    head: NodeId,
    pattern: Pattern,
    render: RenderFn,
    not_found: Option<NotFoundFn>,
    last_params: RefCell<Option<Params>>,
    state: Cell<RouteState>,
    pop_subscription: Cell<Option<ListenerId>>,
}

impl fmt::Debug for RouteCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCapability")
            .field("head", &self.head)
            .field("pattern", &self.pattern.source())
            .field("exact", &self.pattern.is_exact())
            .field("state", &self.state.get())
            .field("last_params", &self.last_params.borrow())
            .field("has_not_found", &self.not_found.is_some())
            .field("pop_subscription", &self.pop_subscription.get())
            .finish_non_exhaustive()
    }
}

impl RouteCapability {
    /// The route's element.
    #[must_use]
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// The route's own pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RouteState {
        self.state.get()
    }

    /// The parameters of the last successful draw.
    #[must_use]
    pub fn last_params(&self) -> Option<Params> {
        self.last_params.borrow().clone()
    }

    /// Whether this route elected itself navigation root and holds the pop
    /// subscription.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.pop_subscription.get().is_some()
    }

    /// The fully-qualified pattern text: every ancestor route's pattern,
    /// outermost first, followed by this one's.
    pub fn path(&self, rt: &Runtime) -> Result<String, RouterError> {
        let mut path = self.parent_path(rt)?;
        path.push_str(self.pattern.source());
        Ok(path)
    }

    fn parent_path(&self, rt: &Runtime) -> Result<String, RouterError> {
        let router = Router::get(rt)?;
        match rt.lookup_up(self.head, router.route_kind()) {
            Some(parent) => parent.path(rt),
            None => Ok(String::new()),
        }
    }

    /// Draws this route for `params`, then dispatches `remaining` to its
    /// logical child routes.
    ///
    /// The render function runs only when the head is empty or `params`
    /// differs from the last draw, so an ancestor redraw never re-renders an
    /// unchanged subtree.
    pub fn draw(
        &self,
        rt: &mut Runtime,
        remaining: &str,
        params: &Params,
    ) -> Result<(), RouterError> {
        let router = Router::get(rt)?;
        if !rt.tree().is_alive(self.head) {
            return Ok(());
        }
        let empty = rt.tree().first_child(self.head).is_none();
        let rerender = empty || self.last_params.borrow().as_ref() != Some(params);
        if rerender {
            self.state.set(RouteState::Stale);
            let content = (self.render)(rt, params)?;
            place(rt, self.head, &content)?;
        }
        *self.last_params.borrow_mut() = Some(params.clone());
        self.state.set(RouteState::Idle);
        rt.tracer().draw(&DrawEvent {
            route: self.head,
            pattern: self.pattern.source(),
            remaining,
            rerendered: rerender,
        });

        let top = rt.tree().root_of(self.head);
        let mut found = false;
        for child in rt.lookup_children(self.head, router.route_kind()) {
            match child.pattern.match_prefix(remaining) {
                Some(m) => {
                    child.draw(rt, &remaining[m.consumed..], &m.params)?;
                    found = true;
                }
                None => child.clear(rt)?,
            }
            // A descendant's not-found cascade replaced our content, or the
            // content of a route above us.
            let detached = rt.tree().root_of(self.head) != top;
            if detached || self.state.get() == RouteState::NotFound {
                return Ok(());
            }
        }
        if !found && !remaining.is_empty() {
            self.render_not_found(rt, remaining)?;
        }
        Ok(())
    }

    /// Shows not-found content for `path`: this route's own renderer if it
    /// has one, otherwise the nearest ancestor route's.
    ///
    /// When no route up to the top has a renderer the cascade ends silently.
    pub fn render_not_found(&self, rt: &mut Runtime, path: &str) -> Result<(), RouterError> {
        let router = Router::get(rt)?;
        if let Some(not_found) = &self.not_found {
            let content = not_found(rt, path)?;
            place(rt, self.head, &content)?;
            // The next successful match must redraw over this content.
            *self.last_params.borrow_mut() = None;
            self.state.set(RouteState::NotFound);
            rt.tracer().not_found(&NotFoundEvent {
                route: self.head,
                path,
                handled: true,
            });
            return Ok(());
        }
        match rt.lookup_up(self.head, router.route_kind()) {
            Some(parent) => parent.render_not_found(rt, path),
            None => {
                rt.tracer().not_found(&NotFoundEvent {
                    route: self.head,
                    path,
                    handled: false,
                });
                Ok(())
            }
        }
    }

    /// Unmounts the route's content and drops the history subscriptions of
    /// every link inside it.
    pub fn clear(&self, rt: &mut Runtime) -> Result<(), RouterError> {
        let router = Router::get(rt)?;
        if !rt.tree().is_alive(self.head) {
            return Ok(());
        }
        if self.state.get() == RouteState::Unmounted && rt.tree().first_child(self.head).is_none() {
            return Ok(());
        }
        let unsubscribed = rt
            .lookup_down(self.head, router.link_kind())
            .iter()
            .filter(|link| link.unsubscribe(&router))
            .count();
        rt.clear_children(self.head);
        *self.last_params.borrow_mut() = None;
        self.state.set(RouteState::Unmounted);
        rt.tracer().clear(&ClearEvent {
            route: self.head,
            pattern: self.pattern.source(),
            unsubscribed,
        });
        Ok(())
    }

    /// Handles a navigation request for the absolute path `target`.
    ///
    /// If this route's fully-qualified pattern is a prefix of `target` (all
    /// of it, for an exact route), the route draws the remainder with its own
    /// parameters. Otherwise the
    /// request bubbles to the parent route (no longer originating), and at
    /// the top it ends in the not-found cascade. An originating request also
    /// pushes `target` onto the session history.
    pub fn navigate(
        &self,
        rt: &mut Runtime,
        target: &str,
        originating: bool,
    ) -> Result<(), RouterError> {
        let router = Router::get(rt)?;
        let prefix = self.parent_path(rt)?;
        let qualified = Pattern::qualified(&prefix, &self.pattern)?;
        let matched = qualified.match_own(target, self.pattern.params().len());
        rt.tracer().navigate(&NavigateEvent {
            route: self.head,
            target,
            qualified: qualified.source(),
            originating,
            matched: matched.is_some(),
        });
        match matched {
            Some(m) => self.draw(rt, &target[m.consumed..], &m.params)?,
            None => match rt.lookup_up(self.head, router.route_kind()) {
                Some(parent) => parent.navigate(rt, target, false)?,
                None => self.render_not_found(rt, target)?,
            },
        }
        if originating {
            router.history().push_path(target);
        }
        Ok(())
    }
}

/// Builder for route nodes.
///
/// ```
/// # use std::rc::Rc;
/// # use tendril_core::Runtime;
/// # use tendril_router::{MemoryHistory, Route, Router};
/// let mut rt = Runtime::new();
/// Router::install(&mut rt, Rc::new(MemoryHistory::new("/users/7")));
///
/// let app = Route::new("")
///     .render(|rt, _| {
///         // Child routes are built fresh on every render.
///         let users = Route::new("/users/:id")
///             .exact()
///             .render(|rt, params| {
///                 let text = rt.text(format!("user {}", params["id"]));
///                 Ok(vec![text])
///             })
///             .build(rt)?;
///         Ok(vec![users])
///     })
///     .build(&mut rt)?;
/// rt.mount([app]);
/// rt.settle();
///
/// assert_eq!(rt.tree().text_content(app), "user 7");
/// # Ok::<(), tendril_router::RouterError>(())
/// ```
pub struct Route {
    path: String,
    exact: bool,
    render: Option<RenderFn>,
    not_found: Option<NotFoundFn>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("exact", &self.exact)
            .field("has_render", &self.render.is_some())
            .field("has_not_found", &self.not_found.is_some())
            .finish()
    }
}

impl Route {
    /// Starts a route for `path` (see [`Pattern`] for the syntax).
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            exact: false,
            render: None,
            not_found: None,
        }
    }

    /// Requires the pattern to consume the whole remaining path.
    #[must_use]
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    /// Sets the render function.
    #[must_use]
    pub fn render(
        mut self,
        f: impl Fn(&mut Runtime, &Params) -> Result<Content, RouterError> + 'static,
    ) -> Self {
        self.render = Some(Rc::new(f));
        self
    }

    /// Sets the not-found renderer.
    #[must_use]
    pub fn not_found(
        mut self,
        f: impl Fn(&mut Runtime, &str) -> Result<Content, RouterError> + 'static,
    ) -> Self {
        self.not_found = Some(Rc::new(f));
        self
    }

    /// Creates the detached route node and registers its capability.
    ///
    /// Once the caller has linked the node into place, the next settle checks
    /// whether it is the top-level route; if so it subscribes to pop events
    /// and performs the first draw from the current history path.
    pub fn build(self, rt: &mut Runtime) -> Result<NodeId, RouterError> {
        let router = Router::get(rt)?;
        let pattern = Pattern::compile(&self.path, self.exact)?;
        let head = rt.element("route", []);
        rt.tree_mut().set_attribute(head, "path", self.path.as_str());
        let capability = RouteCapability {
            head,
            pattern,
            render: self.render.unwrap_or_else(|| Rc::new(render_nothing)),
            not_found: self.not_found,
            last_params: RefCell::new(None),
            state: Cell::new(RouteState::Unmounted),
            pop_subscription: Cell::new(None),
        };
        rt.register(head, router.route_kind(), Some(capability))?;
        rt.defer("elect-root", move |rt| Ok(elect_root(rt, head)?));
        Ok(head)
    }
}

/// Puts rendered `content` under `head`, refusing destroyed nodes.
pub(crate) fn place(
    rt: &mut Runtime,
    head: NodeId,
    content: &[NodeId],
) -> Result<(), RouterError> {
    if let Some(&stale) = content.iter().find(|&&n| !rt.tree().is_alive(n)) {
        return Err(RouterError::StaleContent(stale));
    }
    rt.replace_children(head, content);
    Ok(())
}

fn render_nothing(_: &mut Runtime, _: &Params) -> Result<Content, RouterError> {
    Ok(Vec::new())
}

/// Deferred check run for every route after construction.
fn elect_root(rt: &mut Runtime, head: NodeId) -> Result<(), RouterError> {
    if !rt.tree().is_alive(head) {
        return Ok(());
    }
    let router = Router::get(rt)?;
    let kind = router.route_kind();
    let Some(provider) = rt.provider_of(head, kind) else {
        return Ok(());
    };
    if rt.tree().parent(head).is_none() || rt.anchor(head, kind).is_some() {
        return Ok(());
    }
    let route = rt.capability(kind, provider);

    let listener: PopListener = Rc::new(move |rt: &mut Runtime| -> Result<(), RouterError> {
        let router = Router::get(rt)?;
        if !rt.tree().is_alive(head) {
            return Ok(());
        }
        let Some(route) = rt.provided(head, router.route_kind()) else {
            return Ok(());
        };
        let path = router.history().current_path();
        draw_path(rt, &route, &path)?;
        Router::refresh_links(rt)
    });
    let history = Rc::clone(router.history());
    let id = history.subscribe_pop(listener);
    route.pop_subscription.set(Some(id));
    rt.on_reclaim(
        provider,
        Box::new(move || {
            history.unsubscribe(id);
        }),
    );

    let path = router.history().current_path();
    rt.tracer().root_elected(&RootElectedEvent {
        route: head,
        path: &path,
    });
    draw_path(rt, &route, &path)?;
    Router::refresh_links(rt)
}

/// Draws the navigation root for a full history path. The root's own pattern
/// has to match first, the same as for a navigation request.
fn draw_path(
    rt: &mut Runtime,
    route: &RouteCapability,
    path: &str,
) -> Result<(), RouterError> {
    match route.pattern.match_prefix(path) {
        Some(m) => route.draw(rt, &path[m.consumed..], &m.params),
        None => {
            route.clear(rt)?;
            route.render_not_found(rt, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{History, MemoryHistory};

    fn setup(path: &str) -> (Runtime, Rc<MemoryHistory>) {
        let mut rt = Runtime::new();
        let history = Rc::new(MemoryHistory::new(path));
        Router::install(&mut rt, history.clone());
        (rt, history)
    }

    fn route_of(rt: &Runtime, head: NodeId) -> Rc<RouteCapability> {
        let router = Router::get(rt).unwrap();
        rt.provided(head, router.route_kind()).unwrap()
    }

    #[test]
    fn draw_with_equal_params_renders_once() {
        let (mut rt, _) = setup("/");
        let renders = Rc::new(Cell::new(0));
        let count = Rc::clone(&renders);
        let head = Route::new("/users/:id")
            .render(move |rt, _| {
                count.set(count.get() + 1);
                Ok(vec![rt.text("user")])
            })
            .build(&mut rt)
            .unwrap();
        let route = route_of(&rt, head);
        let mut params = Params::new();
        params.insert("id".into(), "7".into());

        route.draw(&mut rt, "", &params).unwrap();
        route.draw(&mut rt, "", &params.clone()).unwrap();
        assert_eq!(renders.get(), 1, "second draw only re-confirms");
        assert_eq!(route.state(), RouteState::Idle);

        params.insert("id".into(), "8".into());
        route.draw(&mut rt, "", &params).unwrap();
        assert_eq!(renders.get(), 2, "changed params re-render");
        assert_eq!(route.last_params(), Some(params));
    }

    #[test]
    fn only_logical_children_are_dispatched() {
        let (mut rt, _) = setup("/");
        let inner = Route::new("/deep").build(&mut rt).unwrap();
        let outer_child = Route::new("/a")
            .render(move |_, _| Ok(vec![inner]))
            .build(&mut rt)
            .unwrap();
        let root = Route::new("")
            .render(move |rt, _| Ok(vec![rt.element("div", [outer_child])]))
            .build(&mut rt)
            .unwrap();

        let route = route_of(&rt, root);
        route.draw(&mut rt, "/a", &Params::new()).unwrap();
        assert_eq!(route_of(&rt, outer_child).state(), RouteState::Idle);
        assert_eq!(
            route_of(&rt, inner).state(),
            RouteState::Unmounted,
            "the grandchild is the child's business"
        );
        assert_eq!(route.path(&rt).unwrap(), "");
        assert_eq!(route_of(&rt, inner).path(&rt).unwrap(), "/a/deep");
    }

    #[test]
    fn not_found_cascades_to_nearest_renderer() {
        let (mut rt, _) = setup("/");
        let child = Route::new("/section").build(&mut rt).unwrap();
        let root = Route::new("")
            .render(move |_, _| Ok(vec![child]))
            .not_found(|rt, path| Ok(vec![rt.text(format!("no page at {path}"))]))
            .build(&mut rt)
            .unwrap();
        let route = route_of(&rt, root);

        route.draw(&mut rt, "/section/missing", &Params::new()).unwrap();
        assert_eq!(route.state(), RouteState::NotFound);
        assert_eq!(route.last_params(), None);
        assert_eq!(rt.tree().text_content(root), "no page at /missing");

        // A later good match redraws over the not-found content.
        route.draw(&mut rt, "/section", &Params::new()).unwrap();
        assert_eq!(route.state(), RouteState::Idle);
        assert_eq!(rt.tree().text_content(root), "");
        assert_eq!(rt.tree().child_count(root), 1);
    }

    #[test]
    fn unhandled_not_found_ends_at_the_top() {
        let (mut rt, _) = setup("/");
        let root = Route::new("").build(&mut rt).unwrap();
        let route = route_of(&rt, root);
        route.draw(&mut rt, "/nowhere", &Params::new()).unwrap();
        assert_eq!(route.state(), RouteState::Idle);
    }

    #[test]
    fn top_level_route_elects_itself_once() {
        let (mut rt, history) = setup("/x");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let child = Route::new("/x").build(&mut rt).unwrap();
        let root = Route::new("")
            .render(move |_, params| {
                log.borrow_mut().push(params.clone());
                Ok(vec![child])
            })
            .build(&mut rt)
            .unwrap();
        rt.mount([root]);
        let report = rt.settle();
        assert!(report.is_clean(), "{:?}", report.errors);

        assert!(route_of(&rt, root).is_root());
        assert!(!route_of(&rt, child).is_root());
        assert_eq!(history.listener_count(), 1);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(route_of(&rt, child).state(), RouteState::Idle);

        // Reclaiming the root drops its pop subscription.
        rt.remove(root);
        rt.settle();
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn detached_routes_never_elect() {
        let (mut rt, history) = setup("/");
        let _orphan = Route::new("").build(&mut rt).unwrap();
        rt.settle();
        assert_eq!(history.listener_count(), 0);
    }

    fn text_route(path: &str, text: &'static str) -> Route {
        Route::new(path)
            .exact()
            .render(move |rt, _| Ok(vec![rt.text(text)]))
    }

    #[test]
    fn root_pattern_is_matched_on_load_and_pop() {
        let (mut rt, _) = setup("/app/x");
        let root = Route::new("/app")
            .render(|rt, _| {
                let x = text_route("/x", "X").build(rt)?;
                Ok(vec![rt.element("div", [x])])
            })
            .not_found(|rt, path| Ok(vec![rt.text(format!("404 {path}"))]))
            .build(&mut rt)
            .unwrap();
        rt.mount([root]);
        let report = rt.settle();
        assert!(report.is_clean(), "{:?}", report.errors);
        assert_eq!(rt.tree().text_content(root), "X", "first draw strips /app");

        Router::navigate(&mut rt, "/app/y").unwrap();
        assert_eq!(rt.tree().text_content(root), "404 /y");
        rt.settle();

        Router::back(&mut rt).unwrap();
        assert_eq!(route_of(&rt, root).state(), RouteState::Idle);
        assert_eq!(rt.tree().text_content(root), "X", "pop strips /app too");
    }

    #[test]
    fn root_pattern_mismatch_on_load_is_not_found() {
        let (mut rt, _) = setup("/other");
        let root = Route::new("/app")
            .render(|rt, _| Ok(vec![rt.text("app")]))
            .not_found(|rt, path| Ok(vec![rt.text(format!("404 {path}"))]))
            .build(&mut rt)
            .unwrap();
        rt.mount([root]);
        rt.settle();
        assert_eq!(route_of(&rt, root).state(), RouteState::NotFound);
        assert_eq!(rt.tree().text_content(root), "404 /other");
    }

    #[test]
    fn cascade_above_stops_sibling_dispatch() {
        let (mut rt, _) = setup("/b/c/g");
        let sibling_draws = Rc::new(Cell::new(0));
        let count = Rc::clone(&sibling_draws);
        let root = Route::new("")
            .render(move |rt, _| {
                let count = Rc::clone(&count);
                let b = Route::new("/b")
                    .render(move |rt, _| {
                        let c = Route::new("/c")
                            .render(|rt, _| Ok(vec![text_route("/g", "G").build(rt)?]))
                            .build(rt)?;
                        let count = Rc::clone(&count);
                        // Matches any leaf, so a draw reaching it with a new
                        // path renders again.
                        let d = Route::new("/c")
                            .render(move |rt, _| {
                                let count = Rc::clone(&count);
                                let leaf = Route::new("/:leaf")
                                    .render(move |_, _| {
                                        count.set(count.get() + 1);
                                        Ok(Vec::new())
                                    })
                                    .build(rt)?;
                                Ok(vec![leaf])
                            })
                            .build(rt)?;
                        Ok(vec![c, d])
                    })
                    .build(rt)?;
                Ok(vec![b])
            })
            .not_found(|rt, path| Ok(vec![rt.text(format!("404 {path}"))]))
            .build(&mut rt)
            .unwrap();
        rt.mount([root]);
        rt.settle();
        assert_eq!(rt.tree().text_content(root), "G");
        assert_eq!(sibling_draws.get(), 1);

        Router::navigate(&mut rt, "/b/c/zzz").unwrap();
        assert_eq!(route_of(&rt, root).state(), RouteState::NotFound);
        assert_eq!(rt.tree().text_content(root), "404 /zzz");
        assert_eq!(sibling_draws.get(), 1, "the detached sibling is left alone");
    }

    #[test]
    fn destroyed_content_is_an_error() {
        let (mut rt, _) = setup("/");
        let gone = rt.text("gone");
        rt.destroy(gone);
        let head = Route::new("")
            .render(move |_, _| Ok(vec![gone]))
            .build(&mut rt)
            .unwrap();
        let err = route_of(&rt, head)
            .draw(&mut rt, "", &Params::new())
            .unwrap_err();
        assert!(matches!(err, RouterError::StaleContent(n) if n == gone));
    }

    #[test]
    fn navigate_bubbles_to_the_matching_ancestor() {
        let (mut rt, history) = setup("/a");
        let b = Route::new("/b").exact().build(&mut rt).unwrap();
        let a = Route::new("/a").exact().build(&mut rt).unwrap();
        let root = Route::new("")
            .render(move |_, _| Ok(vec![a, b]))
            .build(&mut rt)
            .unwrap();
        rt.mount([root]);
        rt.settle();
        assert_eq!(route_of(&rt, a).state(), RouteState::Idle);

        // /b does not match a's qualified pattern, so a asks the root.
        route_of(&rt, a).navigate(&mut rt, "/b", true).unwrap();
        assert_eq!(route_of(&rt, a).state(), RouteState::Unmounted);
        assert_eq!(route_of(&rt, b).state(), RouteState::Idle);
        assert_eq!(history.entries(), ["/a", "/b"], "pushed exactly once");
    }
}

// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Links: navigation requests with an active/inactive view.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tendril_core::node::NodeId;
use tendril_core::trace::LinkRefreshEvent;
use tendril_core::{Content, Runtime};

use crate::error::RouterError;
use crate::history::{ListenerId, PopListener};
use crate::route::place;
use crate::router::Router;

/// What a link render function sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkView<'a> {
    /// The navigation target.
    pub to: &'a str,
    /// Whether `to` is the current history path.
    pub active: bool,
}

/// Renders a link's content.
pub type LinkRenderFn = Rc<dyn Fn(&mut Runtime, &LinkView<'_>) -> Result<Content, RouterError>>;

/// The capability a link node provides.
pub struct LinkCapability {
    node: NodeId,
    to: String,
    render: LinkRenderFn,
    active: Cell<bool>,
    subscription: Cell<Option<ListenerId>>,
}

impl fmt::Debug for LinkCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkCapability")
            .field("node", &self.node)
            .field("to", &self.to)
            .field("active", &self.active.get())
            .field("subscription", &self.subscription.get())
            .finish_non_exhaustive()
    }
}

impl LinkCapability {
    /// The link's element.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The navigation target.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Whether the link was active at its last refresh.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Whether the link holds a pop subscription.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.get().is_some()
    }

    /// Drops the link's pop subscription, if any.
    pub(crate) fn unsubscribe(&self, router: &Router) -> bool {
        match self.subscription.take() {
            Some(id) => router.history().unsubscribe(id),
            None => false,
        }
    }

    /// Re-evaluates the active state against the current history path and
    /// re-renders if it flipped. Returns whether it flipped.
    pub fn refresh(&self, rt: &mut Runtime) -> Result<bool, RouterError> {
        let router = Router::get(rt)?;
        let active = router.history().current_path() == self.to;
        let changed = active != self.active.get();
        if changed {
            self.active.set(active);
            self.paint(rt)?;
        }
        rt.tracer().link_refresh(&LinkRefreshEvent {
            link: self.node,
            to: &self.to,
            active,
            changed,
        });
        Ok(changed)
    }

    fn paint(&self, rt: &mut Runtime) -> Result<(), RouterError> {
        paint(rt, self.node, &self.to, self.active.get(), &self.render)
    }
}

fn paint(
    rt: &mut Runtime,
    node: NodeId,
    to: &str,
    active: bool,
    render: &LinkRenderFn,
) -> Result<(), RouterError> {
    if active {
        rt.tree_mut().set_attribute(node, "aria-current", "page");
    } else {
        rt.tree_mut().remove_attribute(node, "aria-current");
    }
    let content = render(rt, &LinkView { to, active })?;
    place(rt, node, &content)
}

fn render_target(rt: &mut Runtime, view: &LinkView<'_>) -> Result<Content, RouterError> {
    Ok(vec![rt.text(view.to)])
}

/// Builder for link nodes.
pub struct Link {
    to: String,
    render: Option<LinkRenderFn>,
    track_history: bool,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("to", &self.to)
            .field("has_render", &self.render.is_some())
            .field("track_history", &self.track_history)
            .finish()
    }
}

impl Link {
    /// Starts a link to the absolute path `to`.
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            render: None,
            track_history: false,
        }
    }

    /// Sets the render function. Without one, the link shows its target.
    #[must_use]
    pub fn render(
        mut self,
        f: impl Fn(&mut Runtime, &LinkView<'_>) -> Result<Content, RouterError> + 'static,
    ) -> Self {
        self.render = Some(Rc::new(f));
        self
    }

    /// Also refresh on back/forward navigation.
    ///
    /// The subscription is dropped when the link is cleared by its route or
    /// reclaimed.
    #[must_use]
    pub fn track_history(mut self) -> Self {
        self.track_history = true;
        self
    }

    /// Creates the detached link node, renders it once, and registers its
    /// capability.
    pub fn build(self, rt: &mut Runtime) -> Result<NodeId, RouterError> {
        let router = Router::get(rt)?;
        let node = rt.element("link", []);
        rt.tree_mut().set_attribute(node, "href", self.to.as_str());
        let render = self.render.unwrap_or_else(|| Rc::new(render_target));
        let active = router.history().current_path() == self.to;
        paint(rt, node, &self.to, active, &render)?;

        let subscription = self.track_history.then(|| {
            let listener: PopListener = Rc::new(move |rt: &mut Runtime| -> Result<(), RouterError> {
                let router = Router::get(rt)?;
                if !rt.tree().is_alive(node) {
                    return Ok(());
                }
                if let Some(link) = rt.provided(node, router.link_kind()) {
                    link.refresh(rt)?;
                }
                Ok(())
            });
            router.history().subscribe_pop(listener)
        });

        let capability = LinkCapability {
            node,
            to: self.to,
            render,
            active: Cell::new(active),
            subscription: Cell::new(subscription),
        };
        let provider = match rt.register(node, router.link_kind(), Some(capability)) {
            Ok(provider) => provider,
            Err(err) => {
                if let Some(id) = subscription {
                    router.history().unsubscribe(id);
                }
                return Err(err.into());
            }
        };
        if let Some(id) = subscription {
            let history = Rc::clone(router.history());
            rt.on_reclaim(
                provider,
                Box::new(move || {
                    history.unsubscribe(id);
                }),
            );
        }
        Ok(node)
    }

    /// Activates the link at `node`: the nearest enclosing route navigates to
    /// the link's target (recording a history entry), then every link
    /// refreshes its active state.
    pub fn activate(rt: &mut Runtime, node: NodeId) -> Result<(), RouterError> {
        let router = Router::get(rt)?;
        let link = rt
            .provided(node, router.link_kind())
            .ok_or(RouterError::NotALink(node))?;
        let route = rt
            .lookup_up(node, router.route_kind())
            .ok_or(RouterError::NoEnclosingRoute(node))?;
        route.navigate(rt, link.to(), true)?;
        Router::refresh_links(rt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{History, MemoryHistory};
    use crate::route::Route;

    fn setup(path: &str) -> (Runtime, Rc<MemoryHistory>) {
        let mut rt = Runtime::new();
        let history = Rc::new(MemoryHistory::new(path));
        Router::install(&mut rt, history.clone());
        (rt, history)
    }

    #[test]
    fn default_render_shows_target_and_marks_active() {
        let (mut rt, _) = setup("/home");
        let home = Link::new("/home").build(&mut rt).unwrap();
        let away = Link::new("/away").build(&mut rt).unwrap();
        assert_eq!(rt.tree().text_content(home), "/home");
        assert_eq!(rt.tree().attribute(home, "href"), Some("/home"));
        assert_eq!(rt.tree().attribute(home, "aria-current"), Some("page"));
        assert_eq!(rt.tree().attribute(away, "aria-current"), None);
    }

    #[test]
    fn refresh_repaints_only_on_flip() {
        let (mut rt, history) = setup("/");
        let paints = Rc::new(Cell::new(0));
        let count = Rc::clone(&paints);
        let node = Link::new("/a")
            .render(move |rt, view| {
                count.set(count.get() + 1);
                let label = if view.active { "[a]" } else { "a" };
                Ok(vec![rt.text(label)])
            })
            .build(&mut rt)
            .unwrap();
        let router = Router::get(&rt).unwrap();
        let link = rt.provided(node, router.link_kind()).unwrap();
        assert_eq!(paints.get(), 1);

        assert!(!link.refresh(&mut rt).unwrap());
        assert_eq!(paints.get(), 1, "inactive stays inactive");

        history.push_path("/a");
        assert!(link.refresh(&mut rt).unwrap());
        assert!(link.is_active());
        assert_eq!(rt.tree().text_content(node), "[a]");
        assert_eq!(paints.get(), 2);
    }

    #[test]
    fn tracked_links_drop_their_subscription_when_reclaimed() {
        let (mut rt, history) = setup("/");
        let node = Link::new("/a").track_history().build(&mut rt).unwrap();
        rt.mount([node]);
        rt.settle();
        assert_eq!(history.listener_count(), 1);

        rt.remove(node);
        rt.settle();
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn activation_needs_an_enclosing_route() {
        let (mut rt, _) = setup("/");
        let node = Link::new("/a").build(&mut rt).unwrap();
        assert!(matches!(
            Link::activate(&mut rt, node),
            Err(RouterError::NoEnclosingRoute(n)) if n == node
        ));
        let plain = rt.element("div", []);
        assert!(matches!(
            Link::activate(&mut rt, plain),
            Err(RouterError::NotALink(_))
        ));
    }

    #[test]
    fn tracked_link_follows_back_navigation() {
        let (mut rt, history) = setup("/");
        let link = Link::new("/a").track_history().build(&mut rt).unwrap();
        let root = Route::new("")
            .render(move |_, _| Ok(vec![link]))
            .build(&mut rt)
            .unwrap();
        rt.mount([root]);
        rt.settle();

        Link::activate(&mut rt, link).unwrap();
        assert_eq!(rt.tree().attribute(link, "aria-current"), Some("page"));

        assert!(Router::back(&mut rt).unwrap());
        assert_eq!(history.current_path(), "/");
        assert_eq!(rt.tree().attribute(link, "aria-current"), None);
    }
}
